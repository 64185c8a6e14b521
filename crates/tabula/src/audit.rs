//! Audit and soft-delete policy hook.
//!
//! An [`AuditPolicy`] decides whether deletes against a table are rewritten
//! into updates of marker columns. Rules that stamp audit columns on insert
//! or update belong to the caller's argument records.

use crate::builder::SqlBuilder;
use crate::dialect::statement::UpdateStatement;
use crate::error::{TabulaResult, ValidationError};
use crate::metadata::TableOrViewMetadata;
use crate::sql::Sql;
use crate::value::Value;
use std::fmt;

pub trait AuditPolicy: Send + Sync + fmt::Debug {
    /// Whether deletes against `table` become soft deletes.
    fn uses_soft_delete(&self, table: &TableOrViewMetadata) -> bool;

    /// Marker columns and the values a soft delete writes into them.
    fn soft_delete_assignments(&self, table: &TableOrViewMetadata) -> Vec<(String, Value)>;
}

/// Hard deletes everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuditPolicy;

impl AuditPolicy for NoAuditPolicy {
    fn uses_soft_delete(&self, _table: &TableOrViewMetadata) -> bool {
        false
    }

    fn soft_delete_assignments(&self, _table: &TableOrViewMetadata) -> Vec<(String, Value)> {
        Vec::new()
    }
}

/// Soft deletes driven by "set column X to value V" rules.
///
/// A rule applies to every table that has its column.
///
/// ```
/// use tabula::{SoftDeletePolicy, Value};
///
/// let policy = SoftDeletePolicy::new()
///     .rule("DeletedFlag", true)
///     .rule("DeletedByKey", Value::Null);
/// assert_eq!(policy.rules().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SoftDeletePolicy {
    rules: Vec<(String, Value)>,
}

impl SoftDeletePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.rules.push((column.into(), value.into()));
        self
    }

    pub fn rules(&self) -> &[(String, Value)] {
        &self.rules
    }
}

impl AuditPolicy for SoftDeletePolicy {
    fn uses_soft_delete(&self, table: &TableOrViewMetadata) -> bool {
        self.rules.iter().any(|(c, _)| table.has_column(c))
    }

    fn soft_delete_assignments(&self, table: &TableOrViewMetadata) -> Vec<(String, Value)> {
        self.rules
            .iter()
            .filter(|(c, _)| table.has_column(c))
            .cloned()
            .collect()
    }
}

/// Turn a delete of the rows matched by `filter` into an update of the
/// policy's marker columns.
///
/// Rows whose markers already hold the new values are left out, so a
/// keyed soft delete of an already-deleted row affects nothing. Null marker
/// values only take part in the SET list.
pub(crate) fn soft_delete_rewrite(
    policy: &dyn AuditPolicy,
    table: &TableOrViewMetadata,
    builder: &mut SqlBuilder,
    filter: Option<Sql>,
) -> TabulaResult<UpdateStatement> {
    let assignments = policy.soft_delete_assignments(table);
    if assignments.is_empty() {
        return Err(ValidationError::EmptyRow {
            operation: "soft delete".to_string(),
            table: table.name().to_string(),
        }
        .into());
    }

    let mut set = Vec::with_capacity(assignments.len());
    let mut guards = Vec::new();
    for (column, value) in &assignments {
        let (column, param) = builder.build_assignment(column, value, "deleted")?;
        let mut s = Sql::new(format!("{} = ", column.quoted_name));
        s.push_sql(param.clone());
        set.push(s);

        if !value.is_null() {
            let quoted = &column.quoted_name;
            let mut g = Sql::new(format!("({quoted} IS NULL OR {quoted} <> "));
            g.push_sql(param).push(")");
            guards.push(g);
        }
    }

    let guard = match guards.len() {
        0 => None,
        1 => guards.pop(),
        _ => {
            let mut g = Sql::new("(");
            g.push_sql(Sql::join(guards, " OR ")).push(")");
            Some(g)
        }
    };
    let filter = filter.filter(|f| !f.is_empty());
    let filter = match (filter, guard) {
        (Some(filter), Some(guard)) => {
            let mut out = Sql::new("(");
            out.push_sql(filter).push(") AND ");
            out.push_sql(guard);
            Some(out)
        }
        (filter, guard) => filter.or(guard),
    };

    tracing::debug!(
        target: "tabula.audit",
        table = %table.name(),
        markers = assignments.len(),
        "delete rewritten as soft delete"
    );

    Ok(UpdateStatement {
        table: table.quoted_name().to_string(),
        set: Sql::join(set, ", "),
        filter,
        returning: Vec::new(),
    })
}
