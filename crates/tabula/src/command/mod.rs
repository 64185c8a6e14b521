//! Command builders: one per logical operation.
//!
//! A command is configured, then prepared into a [`PreparedStatement`]. Every
//! `prepare` clones the table's [`SqlBuilder`](crate::builder::SqlBuilder)
//! template, so a command can be prepared any number of times.
//!
//! Execution is left to an [`Executor`] or [`AsyncExecutor`]; mutation
//! commands verify the rows affected against the statement's
//! [`RowCountCheck`].

mod batch;
mod from;
mod key;
mod object;
mod routine;
mod set;

#[cfg(test)]
mod tests;

pub use batch::InsertBatchCommand;
pub use from::{Limit, LimitOptions, SortExpression, TableQuery};
pub use key::KeyTarget;
pub use object::{ObjectCommand, UpsertPlan, resolve_single_key};
pub use routine::RoutineCommand;
pub use set::{DeleteSetCommand, UpdateSetCommand};

use crate::builder::{DesiredColumns, OperationKind};
use crate::config::EngineConfig;
use crate::dialect::Dialect;
use crate::error::{RowCountError, TabulaResult};
use crate::sql::{Parameter, Sql};
use std::fmt;
use std::future::Future;

/// How many rows a mutation must affect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowCountCheck {
    Exactly(u64),
    AtLeast(u64),
}

impl RowCountCheck {
    pub fn is_satisfied_by(self, rows_affected: u64) -> bool {
        match self {
            RowCountCheck::Exactly(n) => rows_affected == n,
            RowCountCheck::AtLeast(n) => rows_affected >= n,
        }
    }
}

impl fmt::Display for RowCountCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowCountCheck::Exactly(n) => write!(f, "exactly {n} row(s)"),
            RowCountCheck::AtLeast(n) => write!(f, "at least {n} row(s)"),
        }
    }
}

/// A rendered statement ready for an executor.
///
/// `parameters` line up with the placeholders in `text`: one entry per `$n`
/// number, per distinct `@name`, or per `?`.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedStatement {
    pub text: String,
    pub parameters: Vec<Parameter>,
    pub row_count_check: Option<RowCountCheck>,
    /// Table or routine the statement targets, for error messages.
    pub target: String,
    pub operation: OperationKind,
}

impl PreparedStatement {
    pub(crate) fn render(
        sql: &Sql,
        dialect: &dyn Dialect,
        config: &EngineConfig,
        operation: OperationKind,
        target: &str,
        row_count_check: Option<RowCountCheck>,
    ) -> TabulaResult<Self> {
        let (text, parameters) = sql.render(dialect.placeholder_style())?;
        let stmt = Self {
            text,
            parameters,
            row_count_check,
            target: target.to_string(),
            operation,
        };

        if config.log_sql {
            tracing::debug!(
                target: "tabula.sql",
                operation = %stmt.operation,
                table = %stmt.target,
                param_count = stmt.parameters.len(),
                sql = %config.truncate_sql(&stmt.text),
                "prepared statement"
            );
        }
        Ok(stmt)
    }

    /// Check the rows affected against the row-count policy.
    ///
    /// Returns `rows_affected` unchanged when the check passes.
    pub fn verify(&self, rows_affected: u64) -> TabulaResult<u64> {
        match self.row_count_check {
            Some(check) if !check.is_satisfied_by(rows_affected) => Err(RowCountError {
                operation: self.operation.to_string(),
                table: self.target.clone(),
                expected: check.to_string(),
                actual: rows_affected,
            }
            .into()),
            _ => Ok(rows_affected),
        }
    }
}

/// A command that renders to a single statement.
pub trait CommandBuilder {
    /// Render the statement, reading back `desired` columns where the
    /// dialect allows it.
    fn prepare(&self, desired: &DesiredColumns) -> TabulaResult<PreparedStatement>;

    /// Debug helper: the statement text with nothing read back.
    fn to_sql(&self) -> TabulaResult<String> {
        Ok(self.prepare(&DesiredColumns::NoColumns)?.text)
    }
}

/// Runs prepared statements and reports rows affected.
pub trait Executor {
    fn execute(&self, stmt: &PreparedStatement) -> TabulaResult<u64>;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute(&self, stmt: &PreparedStatement) -> TabulaResult<u64> {
        (**self).execute(stmt)
    }
}

/// Async mirror of [`Executor`].
pub trait AsyncExecutor: Send + Sync {
    fn execute(
        &self,
        stmt: &PreparedStatement,
    ) -> impl Future<Output = TabulaResult<u64>> + Send;
}

/// A command that changes rows and can be executed directly.
pub trait MutationCommand {
    /// All statements for this command, in execution order.
    fn statements(&self) -> TabulaResult<Vec<PreparedStatement>>;

    /// Run every statement, verifying each one's row count.
    ///
    /// Returns the total rows affected. Statements already run are not
    /// rolled back on failure; wrap the call in a transaction for that.
    fn execute<E: Executor + ?Sized>(&self, executor: &E) -> TabulaResult<u64> {
        let mut total = 0;
        for stmt in self.statements()? {
            let rows = executor.execute(&stmt)?;
            total += stmt.verify(rows)?;
        }
        Ok(total)
    }

    fn execute_async<E: AsyncExecutor + ?Sized>(
        &self,
        executor: &E,
    ) -> impl Future<Output = TabulaResult<u64>> + Send
    where
        Self: Sync,
    {
        async move {
            let statements = self.statements()?;
            let mut total = 0;
            for stmt in &statements {
                let rows = executor.execute(stmt).await?;
                total += stmt.verify(rows)?;
            }
            Ok(total)
        }
    }
}
