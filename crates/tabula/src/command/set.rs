use super::key::KeyTarget;
use super::{CommandBuilder, MutationCommand, PreparedStatement, RowCountCheck};
use crate::audit::soft_delete_rewrite;
use crate::builder::{ApplyOptions, DesiredColumns, FilterOptions, OperationKind, SqlBuilder};
use crate::data_source::DataSource;
use crate::dialect::statement::{DeleteStatement, UpdateStatement};
use crate::error::{TabulaResult, ValidationError};
use crate::mapping::{Argument, Record};
use crate::metadata::TableOrViewMetadata;
use crate::sql::Sql;
use std::sync::Arc;

/// Which rows a set command touches.
#[derive(Debug, Clone, PartialEq)]
enum SetTarget {
    Unset,
    Filter(Record, FilterOptions),
    Where(String, Option<Record>),
    Keys(KeyTarget),
    AllRows,
}

impl SetTarget {
    /// Render the WHERE fragment (`None` for all rows).
    fn build(
        &self,
        source: &DataSource,
        table: &TableOrViewMetadata,
        builder: &mut SqlBuilder,
        operation: OperationKind,
    ) -> TabulaResult<Option<Sql>> {
        match self {
            SetTarget::Unset => Err(ValidationError::MissingFilter {
                operation: operation.to_string(),
                table: table.name().to_string(),
            }
            .into()),
            SetTarget::Filter(record, options) => {
                Ok(Some(builder.apply_filter_value(record, *options)?))
            }
            SetTarget::Where(text, args) => {
                let mut sql = Sql::empty();
                sql.push_template(text, args.as_ref())?;
                Ok(Some(sql))
            }
            SetTarget::Keys(keys) => {
                let column = keys.resolve(source, table)?;
                Ok(Some(keys.build_filter(builder, &column, operation.name())?))
            }
            SetTarget::AllRows => Ok(None),
        }
    }

    fn key_column_name(
        &self,
        source: &DataSource,
        table: &TableOrViewMetadata,
    ) -> TabulaResult<Option<String>> {
        match self {
            SetTarget::Keys(keys) => Ok(Some(keys.resolve(source, table)?.name.clone())),
            _ => Ok(None),
        }
    }
}

/// New values for an [`UpdateSetCommand`].
#[derive(Debug, Clone, PartialEq)]
enum SetValues {
    Record(Record),
    Expression(String, Option<Record>),
}

/// Update every row matching a filter, a WHERE clause, or a key list.
///
/// Without a target the command refuses to prepare; use
/// [`all_rows`](Self::all_rows) to update the whole table.
#[derive(Debug, Clone)]
pub struct UpdateSetCommand<'a> {
    source: &'a DataSource,
    table: Arc<TableOrViewMetadata>,
    values: SetValues,
    target: SetTarget,
    expected_rows: Option<RowCountCheck>,
}

impl<'a> UpdateSetCommand<'a> {
    pub(crate) fn new(source: &'a DataSource, table: Arc<TableOrViewMetadata>, values: Record) -> Self {
        Self {
            source,
            table,
            values: SetValues::Record(values),
            target: SetTarget::Unset,
            expected_rows: None,
        }
    }

    /// Update with a raw `SET` expression; `@name` tokens bind from `args`.
    pub(crate) fn with_expression(
        source: &'a DataSource,
        table: Arc<TableOrViewMetadata>,
        expression: impl Into<String>,
        args: Option<Record>,
    ) -> Self {
        Self {
            source,
            table,
            values: SetValues::Expression(expression.into(), args),
            target: SetTarget::Unset,
            expected_rows: None,
        }
    }

    pub(crate) fn by_keys(
        source: &'a DataSource,
        table: Arc<TableOrViewMetadata>,
        keys: KeyTarget,
        values: Record,
    ) -> Self {
        let expected = keys.expected_rows();
        Self {
            source,
            table,
            values: SetValues::Record(values),
            target: SetTarget::Keys(keys),
            expected_rows: Some(expected),
        }
    }

    pub fn with_filter(self, filter: Record) -> Self {
        self.with_filter_options(filter, FilterOptions::default())
    }

    pub fn with_filter_options(mut self, filter: Record, options: FilterOptions) -> Self {
        self.target = SetTarget::Filter(filter, options);
        self
    }

    /// Restrict with a raw WHERE expression; `@name` tokens bind from `args`.
    pub fn with_where(mut self, expression: impl Into<String>, args: Option<Record>) -> Self {
        self.target = SetTarget::Where(expression.into(), args);
        self
    }

    /// Explicitly target every row of the table.
    pub fn all_rows(mut self) -> Self {
        self.target = SetTarget::AllRows;
        self
    }

    pub fn expected_rows(mut self, rows: u64) -> Self {
        self.expected_rows = Some(RowCountCheck::Exactly(rows));
        self
    }

    pub fn ignore_rows_affected(mut self) -> Self {
        self.expected_rows = None;
        self
    }
}

impl CommandBuilder for UpdateSetCommand<'_> {
    fn prepare(&self, desired: &DesiredColumns) -> TabulaResult<PreparedStatement> {
        let mut builder = self.table.sql_builder();
        let key = self.target.key_column_name(self.source, &self.table)?;
        let set = match &self.values {
            SetValues::Record(record) => {
                builder.apply_argument_value(
                    &Argument::Record(record.clone()),
                    OperationKind::Update,
                    &ApplyOptions::default(),
                )?;
                // Only the addressed key stays out of the SET list.
                builder.override_keys(key.as_slice())?;
                builder.build_set_clause()?
            }
            SetValues::Expression(text, args) => {
                let mut sql = Sql::empty();
                sql.push_template(text, args.as_ref())?;
                sql
            }
        };
        builder.apply_desired_columns(desired)?;

        let filter = self
            .target
            .build(self.source, &self.table, &mut builder, OperationKind::Update)?;
        let stmt = UpdateStatement {
            table: self.table.quoted_name().to_string(),
            set,
            filter,
            returning: builder.build_select_columns(),
        };
        let sql = self.source.dialect().render_update(stmt);
        PreparedStatement::render(
            &sql,
            self.source.dialect(),
            self.source.config(),
            OperationKind::Update,
            &self.table.name().to_string(),
            self.expected_rows,
        )
    }
}

impl MutationCommand for UpdateSetCommand<'_> {
    fn statements(&self) -> TabulaResult<Vec<PreparedStatement>> {
        Ok(vec![self.prepare(&DesiredColumns::NoColumns)?])
    }
}

/// Delete every row matching a filter, a WHERE clause, or a key list.
///
/// Tables under a soft-delete policy get an `UPDATE` of the marker columns
/// instead.
#[derive(Debug, Clone)]
pub struct DeleteSetCommand<'a> {
    source: &'a DataSource,
    table: Arc<TableOrViewMetadata>,
    target: SetTarget,
    expected_rows: Option<RowCountCheck>,
}

impl<'a> DeleteSetCommand<'a> {
    pub(crate) fn new(source: &'a DataSource, table: Arc<TableOrViewMetadata>) -> Self {
        Self {
            source,
            table,
            target: SetTarget::Unset,
            expected_rows: None,
        }
    }

    pub(crate) fn by_keys(
        source: &'a DataSource,
        table: Arc<TableOrViewMetadata>,
        keys: KeyTarget,
    ) -> Self {
        let expected = keys.expected_rows();
        Self {
            source,
            table,
            target: SetTarget::Keys(keys),
            expected_rows: Some(expected),
        }
    }

    pub fn with_filter(self, filter: Record) -> Self {
        self.with_filter_options(filter, FilterOptions::default())
    }

    pub fn with_filter_options(mut self, filter: Record, options: FilterOptions) -> Self {
        self.target = SetTarget::Filter(filter, options);
        self
    }

    pub fn with_where(mut self, expression: impl Into<String>, args: Option<Record>) -> Self {
        self.target = SetTarget::Where(expression.into(), args);
        self
    }

    pub fn all_rows(mut self) -> Self {
        self.target = SetTarget::AllRows;
        self
    }

    pub fn expected_rows(mut self, rows: u64) -> Self {
        self.expected_rows = Some(RowCountCheck::Exactly(rows));
        self
    }

    pub fn ignore_rows_affected(mut self) -> Self {
        self.expected_rows = None;
        self
    }
}

impl CommandBuilder for DeleteSetCommand<'_> {
    fn prepare(&self, desired: &DesiredColumns) -> TabulaResult<PreparedStatement> {
        let mut builder = self.table.sql_builder();
        builder.apply_desired_columns(desired)?;
        let filter = self
            .target
            .build(self.source, &self.table, &mut builder, OperationKind::Delete)?;
        let returning = builder.build_select_columns();

        let dialect = self.source.dialect();
        let policy = self.source.audit_policy();
        let sql = if policy.uses_soft_delete(&self.table) {
            let mut update = soft_delete_rewrite(policy, &self.table, &mut builder, filter)?;
            update.returning = returning;
            dialect.render_update(update)
        } else {
            dialect.render_delete(DeleteStatement {
                table: self.table.quoted_name().to_string(),
                filter,
                returning,
            })
        };
        PreparedStatement::render(
            &sql,
            dialect,
            self.source.config(),
            OperationKind::Delete,
            &self.table.name().to_string(),
            self.expected_rows,
        )
    }
}

impl MutationCommand for DeleteSetCommand<'_> {
    fn statements(&self) -> TabulaResult<Vec<PreparedStatement>> {
        Ok(vec![self.prepare(&DesiredColumns::NoColumns)?])
    }
}
