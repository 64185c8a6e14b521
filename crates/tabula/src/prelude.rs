//! Convenient imports for typical `tabula` usage.
//!
//! ```ignore
//! use tabula::prelude::*;
//! ```

pub use crate::{
    Argument, AsyncExecutor, CommandBuilder, DataSource, DesiredColumns, EngineConfig, Executor,
    FilterOptions, KeyTarget, Limit, LimitOptions, Mapped, MutationCommand, PreparedStatement,
    Record, RecordField, SchemaCache, SchemaSnapshot, SortExpression, TabulaError, TabulaResult,
    Value,
};

pub use crate::{MySqlDialect, PostgresDialect, SqlServerDialect, SqliteDialect};

pub use crate::{AuditPolicy, SoftDeletePolicy};
