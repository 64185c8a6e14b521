//! # tabula
//!
//! Metadata-driven, dialect-aware SQL command construction.
//!
//! ## Features
//!
//! - **Schema driven**: statements are built from catalog metadata, so
//!   argument records only need to name the columns they carry
//! - **Dialect aware**: PostgreSQL, SQL Server, MySQL and SQLite placeholders,
//!   quoting, upserts, limits and routine calls
//! - **Row-count checks**: single-object mutations fail loudly when they
//!   touch anything but one row
//! - **Safe defaults**: set-based UPDATE/DELETE requires a filter or an
//!   explicit `all_rows()`
//! - **Soft deletes**: an [`AuditPolicy`] can turn deletes into marker updates
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use tabula::prelude::*;
//!
//! let cache = SchemaCache::new(Arc::new(SqlServerDialect), Arc::new(snapshot));
//! let ds = DataSource::new(Arc::new(cache));
//!
//! // INSERT
//! ds.insert("Customer", Record::new().with("FullName", "Ada"))?
//!     .execute(&executor)?;
//!
//! // UPDATE ... WHERE, by filter
//! ds.update_set("Customer", Record::new().with("Balance", 0))?
//!     .with_filter(Record::new().with("State", "CA"))
//!     .execute(&executor)?;
//!
//! // SELECT ... ORDER BY ... OFFSET/FETCH
//! let stmt = ds
//!     .from("Customer")?
//!     .with_sorting([SortExpression::asc("FullName")])
//!     .with_limits(Limit::rows(20).skip(40))
//!     .prepare(&DesiredColumns::AllColumns)?;
//! ```

extern crate self as tabula;

pub mod audit;
pub mod builder;
pub mod command;
pub mod config;
pub mod data_source;
pub mod dialect;
pub mod error;
pub mod ident;
pub mod mapping;
pub mod metadata;
pub mod prelude;
pub mod schema_cache;
pub mod sql;
pub mod types;
pub mod value;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use audit::{AuditPolicy, NoAuditPolicy, SoftDeletePolicy};
pub use builder::{ApplyOptions, DesiredColumns, FilterOptions, OperationKind, SqlBuilder};
pub use command::{
    AsyncExecutor, CommandBuilder, DeleteSetCommand, Executor, InsertBatchCommand, KeyTarget,
    Limit, LimitOptions, MutationCommand, ObjectCommand, PreparedStatement, RoutineCommand,
    RowCountCheck, SortExpression, TableQuery, UpdateSetCommand, UpsertPlan, resolve_single_key,
};
pub use config::EngineConfig;
pub use data_source::DataSource;
pub use dialect::{Dialect, MySqlDialect, PostgresDialect, SqlServerDialect, SqliteDialect};
pub use error::{
    MappingError, ObjectKind, RowCountError, SchemaError, TabulaError, TabulaResult,
    ValidationError,
};
pub use ident::ObjectName;
pub use mapping::{
    Argument, ClassMapping, FieldMapping, Mapped, MappingRegistration, Record, RecordField,
    registered_mappings,
};
pub use metadata::{
    ColumnDef, ColumnMetadata, ForeignKeyConstraint, ForeignKeyDef, IndexDef, IndexMetadata,
    MetadataSource, ParameterDef, ParameterDirection, ParameterMetadata, RoutineDef, RoutineKind,
    RoutineMetadata, SchemaSnapshot, TableDef, TableOrViewMetadata, UserDefinedTypeDef,
    UserDefinedTypeMetadata,
};
pub use schema_cache::SchemaCache;
pub use sql::{Parameter, PlaceholderStyle, Sql};
pub use types::{ClrType, TypeRegistry};
pub use value::{Value, ValueKind};

// Re-export inventory for use by derive macros
pub use inventory;

#[cfg(feature = "derive")]
pub use tabula_derive::Mapped;
