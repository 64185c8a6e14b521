//! Error types for tabula

use thiserror::Error;

/// Result type alias for tabula operations
pub type TabulaResult<T> = Result<T, TabulaError>;

/// Top-level error for statement construction and execution.
#[derive(Debug, Error)]
pub enum TabulaError {
    /// Schema lookup or dialect capability error
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Argument/column mapping error
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Invalid command configuration
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Rows affected did not match the statement's row-count check
    #[error(transparent)]
    RowCount(#[from] RowCountError),

    /// Configuration parse error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error reported by an executor
    #[error("Execution error: {0}")]
    Execution(String),
}

/// Errors raised while resolving database objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("{kind} '{name}' was not found")]
    NotFound { kind: ObjectKind, name: String },

    #[error("cannot map type '{type_name}' to a table or view (tried: {})", .candidates.join(", "))]
    AmbiguousMapping {
        type_name: String,
        candidates: Vec<String>,
    },

    #[error("{feature} is not supported by the {dialect} dialect")]
    Unsupported {
        feature: String,
        dialect: &'static str,
    },

    #[error("invalid metadata for '{object}': {message}")]
    InvalidMetadata { object: String, message: String },
}

/// Kind of database object, used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    TableOrView,
    StoredProcedure,
    ScalarFunction,
    TableFunction,
    UserDefinedType,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ObjectKind::TableOrView => "table or view",
            ObjectKind::StoredProcedure => "stored procedure",
            ObjectKind::ScalarFunction => "scalar function",
            ObjectKind::TableFunction => "table function",
            ObjectKind::UserDefinedType => "user defined type",
        };
        f.write_str(s)
    }
}

/// Errors raised while mapping argument values onto columns and parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("required column '{column}' on '{table}' is not mapped by the argument")]
    ColumnNotMapped { table: String, column: String },

    #[error("none of the properties of the argument match a column on '{table}'")]
    NoMatchingColumns { table: String },

    #[error("none of the desired columns ({}) exist on '{table}'", .columns.join(", "))]
    NoDesiredColumns { table: String, columns: Vec<String> },

    #[error(
        "'{table}' has {key_count} primary key columns; key-based operations need exactly one (use a filter instead)"
    )]
    AmbiguousOrNoKey { table: String, key_count: usize },

    #[error("cannot update '{table}': no primary key, key attribute, or explicit key columns")]
    NoUpdateKey { table: String },

    #[error("cannot delete from '{table}': no primary key, key attribute, or explicit key columns")]
    NoDeleteKey { table: String },

    #[error("key column '{column}' on '{table}' has no value in the argument")]
    MissingKeyValue { table: String, column: String },

    #[error("cannot convert value for '{column}' from {found} to {expected}: {message}")]
    TypeCoercion {
        column: String,
        expected: String,
        found: String,
        message: String,
    },

    #[error("parameter '{name}' is supplied by more than one argument source with different values")]
    DuplicateParameter { name: String },

    #[error("parameter '@{name}' is referenced in SQL text but not supplied")]
    MissingParameter { name: String },

    #[error("batch row {row} for '{table}' maps a different column set than the first row")]
    InconsistentBatchRow { table: String, row: usize },
}

/// Errors raised by command validation before any SQL is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("skip must not be negative (got {0})")]
    NegativeSkip(i64),

    #[error("take must be greater than zero (got {0})")]
    NonPositiveTake(i64),

    #[error("skip requires the Rows limit option (got {0})")]
    SkipRequiresRows(String),

    #[error("{limit} on '{table}' requires a sort order and the table has no primary key")]
    SortRequired { table: String, limit: String },

    #[error(
        "a single row for '{table}' needs {params_per_row} parameters, above the dialect limit of {max_parameters}"
    )]
    RowTooWide {
        table: String,
        params_per_row: usize,
        max_parameters: usize,
    },

    #[error(
        "{operation} on '{table}' requires a filter, a WHERE clause, or all_rows(). This prevents accidental full-table changes."
    )]
    MissingFilter { operation: String, table: String },

    #[error("invalid identifier '{name}': {message}")]
    InvalidIdentifier { name: String, message: String },

    #[error("{operation} on '{table}' was given an empty key list")]
    EmptyKeyList { operation: String, table: String },

    #[error("{operation} on '{table}' has no columns to write")]
    EmptyRow { operation: String, table: String },
}

/// Rows affected did not satisfy a statement's row-count check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} on '{table}' expected {expected} but {actual} rows were affected")]
pub struct RowCountError {
    pub operation: String,
    pub table: String,
    pub expected: String,
    pub actual: u64,
}

impl TabulaError {
    /// Create an execution error from any displayable driver error.
    pub fn execution(message: impl std::fmt::Display) -> Self {
        Self::Execution(message.to_string())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Schema(SchemaError::NotFound { .. }))
    }

    /// Check if this is a row-count mismatch
    pub fn is_row_count(&self) -> bool {
        matches!(self, Self::RowCount(_))
    }

    /// Check if this error reports an unsupported dialect feature
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Schema(SchemaError::Unsupported { .. }))
    }
}

impl SchemaError {
    pub(crate) fn not_found(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn unsupported(feature: impl Into<String>, dialect: &'static str) -> Self {
        Self::Unsupported {
            feature: feature.into(),
            dialect,
        }
    }
}

#[cfg(feature = "postgres")]
impl From<tokio_postgres::Error> for TabulaError {
    fn from(err: tokio_postgres::Error) -> Self {
        Self::Execution(err.to_string())
    }
}

impl From<toml::de::Error> for TabulaError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
