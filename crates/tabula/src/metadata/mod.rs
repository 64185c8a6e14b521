//! Immutable descriptors of database objects.

mod column;
mod foreign_key;
mod index;
mod routine;
mod snapshot;
mod table;

pub use column::ColumnMetadata;
pub use foreign_key::ForeignKeyConstraint;
pub use index::{IndexColumnMetadata, IndexMetadata};
pub use routine::{ParameterDirection, ParameterMetadata, RoutineKind, RoutineMetadata};
pub use snapshot::{
    ColumnDef, ForeignKeyDef, IndexColumnDef, IndexDef, MetadataSource, ParameterDef, RoutineDef,
    SchemaSnapshot, TableDef, UserDefinedTypeDef,
};
pub use table::{TableOrViewMetadata, UserDefinedTypeMetadata};

