//! Statement shapes handed to a [`Dialect`](super::Dialect) for rendering.
//!
//! Command builders fill these with quoted identifiers and parameterized
//! fragments; the dialect arranges them into its own syntax.

use crate::command::Limit;
use crate::metadata::{ParameterDirection, RoutineKind};
use crate::sql::Sql;

#[derive(Debug, Clone)]
pub struct InsertStatement {
    pub table: String,
    pub columns: Vec<String>,
    /// One fragment per row: the comma-separated values without parentheses.
    pub rows: Vec<Sql>,
    pub returning: Vec<String>,
    /// Explicit values are supplied for identity columns.
    pub identity_insert: bool,
    /// Single identity key, for dialects that read it back after the insert.
    pub generated_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateStatement {
    pub table: String,
    pub set: Sql,
    pub filter: Option<Sql>,
    pub returning: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DeleteStatement {
    pub table: String,
    pub filter: Option<Sql>,
    pub returning: Vec<String>,
}

/// Atomic insert-or-update keyed on `key_columns`.
#[derive(Debug, Clone)]
pub struct UpsertStatement {
    pub table: String,
    pub key_columns: Vec<String>,
    pub columns: Vec<String>,
    pub values: Sql,
    /// Non-key columns to overwrite when the row exists.
    pub update_columns: Vec<String>,
    pub returning: Vec<String>,
    pub identity_insert: bool,
}

/// The select list of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    Columns(Vec<String>),
    /// `SELECT 1`: existence only.
    Constant,
    Count,
}

#[derive(Debug, Clone)]
pub struct SelectStatement {
    pub projection: Projection,
    /// Quoted table name or table function invocation.
    pub source: Sql,
    pub filter: Option<Sql>,
    /// Rendered sort terms, e.g. `"Name" DESC`.
    pub order_by: Vec<String>,
    pub limit: Option<Limit>,
}

/// One argument of a routine call.
#[derive(Debug, Clone)]
pub struct CallArgument {
    /// Declared name, e.g. `@CustomerKey` or `p_customer_key`.
    pub name: String,
    /// Bind name without prefix.
    pub variable_name: String,
    /// `None` when the caller supplied nothing for this parameter.
    pub value: Option<Sql>,
    pub direction: ParameterDirection,
}

#[derive(Debug, Clone)]
pub struct RoutineCall {
    pub name: String,
    pub kind: RoutineKind,
    pub arguments: Vec<CallArgument>,
    /// Arguments came from a raw parameter list rather than declared metadata.
    pub raw: bool,
}
