//! Clause construction from column metadata and argument values.
//!
//! [`SqlBuilder`] maps an [`Argument`](crate::mapping::Argument) onto a
//! table's columns or a routine's parameters and emits the clause fragments
//! the dialects assemble into statements.

mod options;
mod sql_builder;


pub use options::{ApplyOptions, DesiredColumns, FilterOptions, OperationKind};
pub use sql_builder::SqlBuilder;
