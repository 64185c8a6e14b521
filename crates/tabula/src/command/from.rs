use super::key::KeyTarget;
use super::routine::RoutineCommand;
use super::{CommandBuilder, PreparedStatement};
use crate::builder::{DesiredColumns, FilterOptions, OperationKind, SqlBuilder};
use crate::data_source::DataSource;
use crate::dialect::statement::{Projection, SelectStatement};
use crate::error::{TabulaResult, ValidationError};
use crate::mapping::Record;
use crate::metadata::TableOrViewMetadata;
use crate::sql::Sql;
use std::fmt;
use std::sync::Arc;

/// How `take` is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LimitOptions {
    #[default]
    None,
    Rows,
    Percentage,
    RowsWithTies,
    PercentageWithTies,
    TableSampleSystemRows,
    TableSampleSystemPercentage,
    TableSampleBernoulliPercentage,
}

impl LimitOptions {
    pub fn is_with_ties(self) -> bool {
        matches!(self, LimitOptions::RowsWithTies | LimitOptions::PercentageWithTies)
    }

    /// The same limit without the tie extension.
    fn without_ties(self) -> Self {
        match self {
            LimitOptions::RowsWithTies => LimitOptions::Rows,
            LimitOptions::PercentageWithTies => LimitOptions::Percentage,
            other => other,
        }
    }
}

impl fmt::Display for LimitOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Row limit, offset and sampling of a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limit {
    pub options: LimitOptions,
    pub skip: Option<i64>,
    pub take: Option<i64>,
    /// Seed for repeatable table samples.
    pub seed: Option<i32>,
}

impl Limit {
    pub fn rows(take: i64) -> Self {
        Self {
            options: LimitOptions::Rows,
            take: Some(take),
            ..Self::default()
        }
    }

    pub fn new(options: LimitOptions, take: i64) -> Self {
        Self {
            options,
            take: Some(take),
            ..Self::default()
        }
    }

    pub fn skip(mut self, skip: i64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn seed(mut self, seed: i32) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Reject negative offsets, non-positive takes, and offsets outside
    /// [`LimitOptions::Rows`].
    pub fn validate(&self) -> TabulaResult<()> {
        if let Some(skip) = self.skip {
            if skip < 0 {
                return Err(ValidationError::NegativeSkip(skip).into());
            }
            if skip > 0 && self.options != LimitOptions::Rows {
                return Err(ValidationError::SkipRequiresRows(self.options.to_string()).into());
            }
        }
        if let Some(take) = self.take {
            if take <= 0 {
                return Err(ValidationError::NonPositiveTake(take).into());
            }
        }
        Ok(())
    }
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortExpression {
    pub column: String,
    pub descending: bool,
}

impl SortExpression {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

#[derive(Debug, Clone)]
enum QuerySource<'a> {
    Table(Arc<TableOrViewMetadata>),
    Function(RoutineCommand<'a>),
}

#[derive(Debug, Clone, PartialEq)]
enum QueryFilter {
    None,
    Record(Record, FilterOptions),
    Where(String, Option<Record>),
    Keys(KeyTarget),
}

/// A query against a table, view or table function.
#[derive(Debug, Clone)]
pub struct TableQuery<'a> {
    source: &'a DataSource,
    from: QuerySource<'a>,
    filter: QueryFilter,
    sort: Vec<SortExpression>,
    limit: Option<Limit>,
    strict: bool,
}

impl<'a> TableQuery<'a> {
    pub(crate) fn table(source: &'a DataSource, table: Arc<TableOrViewMetadata>) -> Self {
        Self::new(source, QuerySource::Table(table))
    }

    pub(crate) fn function(source: &'a DataSource, call: RoutineCommand<'a>) -> Self {
        Self::new(source, QuerySource::Function(call))
    }

    pub(crate) fn by_keys(source: &'a DataSource, table: Arc<TableOrViewMetadata>, keys: KeyTarget) -> Self {
        let mut query = Self::table(source, table);
        query.filter = QueryFilter::Keys(keys);
        query
    }

    fn new(source: &'a DataSource, from: QuerySource<'a>) -> Self {
        Self {
            source,
            from,
            filter: QueryFilter::None,
            sort: Vec::new(),
            limit: None,
            strict: source.config().strict_mode,
        }
    }

    pub fn with_filter(self, filter: Record) -> Self {
        self.with_filter_options(filter, FilterOptions::default())
    }

    pub fn with_filter_options(mut self, filter: Record, options: FilterOptions) -> Self {
        self.filter = QueryFilter::Record(filter, options);
        self
    }

    /// Restrict with a raw WHERE expression; `@name` tokens bind from `args`.
    pub fn with_where(mut self, expression: impl Into<String>, args: Option<Record>) -> Self {
        self.filter = QueryFilter::Where(expression.into(), args);
        self
    }

    pub fn with_sorting(mut self, sort: impl IntoIterator<Item = SortExpression>) -> Self {
        self.sort = sort.into_iter().collect();
        self
    }

    pub fn with_limits(mut self, limit: Limit) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Fail instead of degrading limits that need an order the query lacks.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    fn name(&self) -> String {
        match &self.from {
            QuerySource::Table(t) => t.name().to_string(),
            QuerySource::Function(f) => f.routine().name().to_string(),
        }
    }

    fn builder(&self) -> SqlBuilder {
        match &self.from {
            QuerySource::Table(t) => t.sql_builder(),
            QuerySource::Function(f) => f.routine().sql_builder(),
        }
    }

    fn render_source(&self) -> TabulaResult<Sql> {
        match &self.from {
            QuerySource::Table(t) => Ok(Sql::new(t.quoted_name())),
            QuerySource::Function(f) => f.render_call(),
        }
    }

    fn build_filter(&self, builder: &mut SqlBuilder) -> TabulaResult<Option<Sql>> {
        match &self.filter {
            QueryFilter::None => Ok(None),
            QueryFilter::Record(record, options) => {
                Ok(Some(builder.apply_filter_value(record, *options)?))
            }
            QueryFilter::Where(text, args) => {
                let mut sql = Sql::empty();
                sql.push_template(text, args.as_ref())?;
                Ok(Some(sql))
            }
            QueryFilter::Keys(keys) => {
                let QuerySource::Table(table) = &self.from else {
                    return Ok(None);
                };
                let column = keys.resolve(self.source, table)?;
                Ok(Some(keys.build_filter(builder, &column, "get")?))
            }
        }
    }

    /// Validate the limit against the dialect and settle the ORDER BY it needs.
    fn settle_limit(&self, order_by: &mut Vec<String>) -> TabulaResult<Option<Limit>> {
        let Some(mut limit) = self.limit else {
            return Ok(None);
        };
        limit.validate()?;

        let dialect = self.source.dialect();
        if !dialect.supports_limit(limit.options) {
            return Err(dialect
                .unsupported(&format!("limit option {}", limit.options))
                .into());
        }
        if !order_by.is_empty() || !dialect.limit_requires_sort(&limit) {
            return Ok(Some(limit));
        }

        // Fall back to the primary key for a deterministic order.
        if let QuerySource::Table(table) = &self.from {
            let keys: Vec<String> = table
                .primary_key_columns()
                .map(|c| format!("{} ASC", c.quoted_name))
                .collect();
            if !keys.is_empty() {
                *order_by = keys;
                return Ok(Some(limit));
            }
        }

        if self.strict {
            return Err(ValidationError::SortRequired {
                table: self.name(),
                limit: limit.options.to_string(),
            }
            .into());
        }

        let degraded = limit.options.without_ties();
        if degraded != limit.options {
            tracing::debug!(
                target: "tabula.sql",
                table = %self.name(),
                from = %limit.options,
                to = %degraded,
                "limit has no sort order, dropping WITH TIES"
            );
            limit.options = degraded;
        }
        if dialect.limit_requires_sort(&limit) {
            *order_by = vec!["(SELECT NULL)".to_string()];
        }
        Ok(Some(limit))
    }

    fn prepare_with(&self, projection: Option<Projection>, desired: &DesiredColumns) -> TabulaResult<PreparedStatement> {
        let mut builder = self.builder();
        let counting = projection.is_some();
        let projection = match projection {
            Some(p) => p,
            None => {
                builder.apply_desired_columns(desired)?;
                let columns = builder.build_select_columns();
                if columns.is_empty() {
                    Projection::Constant
                } else {
                    Projection::Columns(columns)
                }
            }
        };

        let source = self.render_source()?;
        let filter = self.build_filter(&mut builder)?;
        let (order_by, limit) = if counting {
            (Vec::new(), None)
        } else {
            let mut order_by = builder.build_order_by(&self.sort)?;
            let limit = self.settle_limit(&mut order_by)?;
            (order_by, limit)
        };

        let stmt = SelectStatement {
            projection,
            source,
            filter,
            order_by,
            limit,
        };
        let dialect = self.source.dialect();
        let sql = dialect.render_select(stmt)?;
        PreparedStatement::render(
            &sql,
            dialect,
            self.source.config(),
            OperationKind::Select,
            &self.name(),
            None,
        )
    }

    /// `SELECT COUNT(*)` with the same source and filter.
    pub fn prepare_count(&self) -> TabulaResult<PreparedStatement> {
        self.prepare_with(Some(Projection::Count), &DesiredColumns::NoColumns)
    }
}

impl CommandBuilder for TableQuery<'_> {
    fn prepare(&self, desired: &DesiredColumns) -> TabulaResult<PreparedStatement> {
        self.prepare_with(None, desired)
    }
}
