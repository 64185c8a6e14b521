use super::{MutationCommand, PreparedStatement, RowCountCheck};
use crate::builder::{ApplyOptions, DesiredColumns, OperationKind, SqlBuilder};
use crate::data_source::DataSource;
use crate::dialect::statement::InsertStatement;
use crate::error::{MappingError, TabulaResult, ValidationError};
use crate::mapping::{Argument, Record};
use crate::metadata::TableOrViewMetadata;
use std::sync::Arc;

/// Largest number of rows one statement may carry.
///
/// `floor(max_parameters / params_per_row)`, capped by the row ceilings.
/// `None` means everything fits in one statement.
pub(crate) fn max_rows_per_statement(
    params_per_row: usize,
    max_parameters: Option<usize>,
    row_caps: &[Option<usize>],
) -> Result<Option<usize>, usize> {
    let by_params = match max_parameters {
        Some(max) if params_per_row > max => return Err(max),
        Some(max) if params_per_row > 0 => Some(max / params_per_row),
        _ => None,
    };
    Ok(row_caps
        .iter()
        .flatten()
        .copied()
        .chain(by_params)
        .filter(|n| *n > 0)
        .min())
}

/// Multi-row insert, split into as many statements as the dialect's
/// parameter and row limits require.
///
/// Statements keep the input order, and each expects as many affected rows
/// as it carries.
#[derive(Debug, Clone)]
pub struct InsertBatchCommand<'a> {
    source: &'a DataSource,
    table: Arc<TableOrViewMetadata>,
    rows: Vec<Record>,
    identity_insert: bool,
    ignore_rows_affected: bool,
    strict_mapping: bool,
}

impl<'a> InsertBatchCommand<'a> {
    pub(crate) fn new(source: &'a DataSource, table: Arc<TableOrViewMetadata>, rows: Vec<Record>) -> Self {
        Self {
            source,
            table,
            rows,
            identity_insert: false,
            ignore_rows_affected: false,
            strict_mapping: false,
        }
    }

    pub fn identity_insert(mut self) -> Self {
        self.identity_insert = true;
        self
    }

    pub fn ignore_rows_affected(mut self) -> Self {
        self.ignore_rows_affected = true;
        self
    }

    pub fn strict_mapping(mut self) -> Self {
        self.strict_mapping = true;
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn row_builders(&self) -> TabulaResult<(Vec<String>, Vec<SqlBuilder>)> {
        let options = ApplyOptions {
            all_columns_required: self.strict_mapping,
            use_key_attribute: false,
            identity_insert: self.identity_insert,
        };

        let mut columns: Option<Vec<String>> = None;
        let mut builders = Vec::with_capacity(self.rows.len());
        for (i, row) in self.rows.iter().enumerate() {
            let mut builder = self.table.sql_builder();
            builder.apply_argument_value(&Argument::Record(row.clone()), OperationKind::Insert, &options)?;
            builder.apply_desired_columns(&DesiredColumns::NoColumns)?;
            let row_columns = builder.build_insert_columns();
            match &columns {
                None => columns = Some(row_columns),
                Some(first) if *first != row_columns => {
                    return Err(MappingError::InconsistentBatchRow {
                        table: self.table.name().to_string(),
                        row: i,
                    }
                    .into());
                }
                Some(_) => {}
            }
            builders.push(builder);
        }
        Ok((columns.unwrap_or_default(), builders))
    }
}

impl MutationCommand for InsertBatchCommand<'_> {
    fn statements(&self) -> TabulaResult<Vec<PreparedStatement>> {
        if self.rows.is_empty() {
            return Ok(Vec::new());
        }
        let (columns, mut builders) = self.row_builders()?;
        if columns.is_empty() {
            return Err(ValidationError::EmptyRow {
                operation: OperationKind::Insert.to_string(),
                table: self.table.name().to_string(),
            }
            .into());
        }

        let dialect = self.source.dialect();
        let config = self.source.config();
        let max_parameters = config.max_parameters.or(dialect.max_parameters());
        let chunk_size = max_rows_per_statement(
            columns.len(),
            max_parameters,
            &[dialect.max_rows_per_statement(), config.max_rows_per_batch],
        )
        .map_err(|max| ValidationError::RowTooWide {
            table: self.table.name().to_string(),
            params_per_row: columns.len(),
            max_parameters: max,
        })?
        .unwrap_or(builders.len());

        tracing::debug!(
            target: "tabula.batch",
            table = %self.table.name(),
            rows = builders.len(),
            params_per_row = columns.len(),
            chunk_size,
            statements = builders.len().div_ceil(chunk_size),
            "splitting batch insert"
        );

        let identity_insert = self.identity_insert
            && self
                .table
                .columns()
                .iter()
                .any(|c| c.is_identity && columns.contains(&c.quoted_name));

        let mut statements = Vec::new();
        for chunk in builders.chunks_mut(chunk_size) {
            let rows = chunk
                .iter_mut()
                .enumerate()
                .map(|(i, b)| b.build_values_clause(Some(i)))
                .collect();
            let stmt = InsertStatement {
                table: self.table.quoted_name().to_string(),
                columns: columns.clone(),
                rows,
                returning: Vec::new(),
                identity_insert,
                generated_key: None,
            };
            let sql = dialect.render_insert(stmt);
            let check = (!self.ignore_rows_affected).then_some(RowCountCheck::Exactly(chunk.len() as u64));
            statements.push(PreparedStatement::render(
                &sql,
                dialect,
                config,
                OperationKind::Insert,
                &self.table.name().to_string(),
                check,
            )?);
        }
        Ok(statements)
    }
}
