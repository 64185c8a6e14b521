use super::{CommandBuilder, MutationCommand, PreparedStatement, RowCountCheck};
use crate::audit::soft_delete_rewrite;
use crate::builder::{ApplyOptions, DesiredColumns, OperationKind, SqlBuilder};
use crate::data_source::DataSource;
use crate::dialect::statement::{
    DeleteStatement, InsertStatement, UpdateStatement, UpsertStatement,
};
use crate::error::{MappingError, TabulaResult};
use crate::mapping::Argument;
use crate::metadata::{ColumnMetadata, TableOrViewMetadata};
use crate::sql::Sql;
use std::sync::Arc;

/// Which statement an upsert renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertPlan {
    /// The key is generated by the database and was not supplied.
    Insert,
    /// The identity key was supplied without identity insert: the row exists.
    Update,
    /// Atomic insert-or-update (`ON CONFLICT`, `MERGE`, `ON DUPLICATE KEY`).
    Merge,
}

impl UpsertPlan {
    /// Pick the upsert branch.
    ///
    /// - `identity_key`: some key column is an identity column.
    /// - `key_supplied`: every key column has a non-null value.
    /// - `identity_insert`: explicit identity values are allowed.
    pub fn decide(identity_key: bool, key_supplied: bool, identity_insert: bool) -> Self {
        match (identity_key, key_supplied, identity_insert) {
            (false, _, _) => UpsertPlan::Merge,
            (true, false, _) => UpsertPlan::Insert,
            (true, true, false) => UpsertPlan::Update,
            (true, true, true) => UpsertPlan::Merge,
        }
    }
}

/// Resolve the one column that identifies a row.
///
/// An explicit column wins. Otherwise the table's primary key is used, and a
/// view without one falls back to its base table's key. Zero or several key
/// columns are a [`MappingError::AmbiguousOrNoKey`].
pub fn resolve_single_key(
    source: &DataSource,
    table: &TableOrViewMetadata,
    explicit: Option<&str>,
) -> TabulaResult<Arc<ColumnMetadata>> {
    if let Some(name) = explicit {
        return table
            .column(name)
            .cloned()
            .ok_or_else(|| {
                MappingError::ColumnNotMapped {
                    table: table.name().to_string(),
                    column: name.to_string(),
                }
                .into()
            });
    }

    let mut keys: Vec<Arc<ColumnMetadata>> = table.primary_key_columns().cloned().collect();
    if keys.is_empty() {
        keys = base_table_keys(source, table)?;
    }
    match <[_; 1]>::try_from(keys) {
        Ok([key]) => Ok(key),
        Err(keys) => Err(MappingError::AmbiguousOrNoKey {
            table: table.name().to_string(),
            key_count: keys.len(),
        }
        .into()),
    }
}

/// The view's columns that correspond to its base table's primary key.
fn base_table_keys(
    source: &DataSource,
    table: &TableOrViewMetadata,
) -> TabulaResult<Vec<Arc<ColumnMetadata>>> {
    let Some(base) = table.base_table() else {
        return Ok(Vec::new());
    };
    if !table.is_view() {
        return Ok(Vec::new());
    }
    let base = source.cache().get_table_or_view_named(base)?;
    Ok(base
        .primary_key_columns()
        .filter_map(|k| table.column(&k.name).cloned())
        .collect())
}

/// Resolve the key columns of an object command into `builder`.
///
/// Precedence: explicit key columns, key-attribute fields (already applied
/// by the builder when `use_key_attribute` is set), the declared primary
/// key, then the base table's key for views. Returns an empty list when
/// nothing applies.
pub(crate) fn resolve_keys(
    source: &DataSource,
    table: &TableOrViewMetadata,
    builder: &mut SqlBuilder,
    explicit: &[String],
) -> TabulaResult<Vec<Arc<ColumnMetadata>>> {
    if !explicit.is_empty() {
        builder.override_keys(explicit)?;
    }
    let keys = builder.key_columns();
    if !keys.is_empty() {
        return Ok(keys);
    }

    let names: Vec<String> = base_table_keys(source, table)?
        .iter()
        .map(|c| c.name.clone())
        .collect();
    if names.is_empty() {
        return Ok(Vec::new());
    }
    builder.override_keys(&names)?;
    Ok(builder.key_columns())
}

/// Insert, update, delete or upsert of a single object.
///
/// Every statement expects exactly one affected row unless
/// [`ignore_rows_affected`](Self::ignore_rows_affected) is set.
#[derive(Debug, Clone)]
pub struct ObjectCommand<'a> {
    source: &'a DataSource,
    table: Arc<TableOrViewMetadata>,
    argument: Argument,
    operation: OperationKind,
    keys: Vec<String>,
    identity_insert: bool,
    use_key_attribute: bool,
    ignore_rows_affected: bool,
    strict_mapping: bool,
}

impl<'a> ObjectCommand<'a> {
    pub(crate) fn new(
        source: &'a DataSource,
        table: Arc<TableOrViewMetadata>,
        argument: Argument,
        operation: OperationKind,
    ) -> Self {
        Self {
            source,
            table,
            argument,
            operation,
            keys: Vec::new(),
            identity_insert: false,
            use_key_attribute: false,
            ignore_rows_affected: false,
            strict_mapping: false,
        }
    }

    pub fn table(&self) -> &Arc<TableOrViewMetadata> {
        &self.table
    }

    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    /// Use these columns as the key instead of the primary key.
    pub fn with_keys<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Write explicit values into identity columns.
    pub fn identity_insert(mut self) -> Self {
        self.identity_insert = true;
        self
    }

    /// Use the fields the mapping marks as keys.
    pub fn use_key_attribute(mut self) -> Self {
        self.use_key_attribute = true;
        self
    }

    pub fn ignore_rows_affected(mut self) -> Self {
        self.ignore_rows_affected = true;
        self
    }

    /// Every required column must be supplied by the argument.
    pub fn strict_mapping(mut self) -> Self {
        self.strict_mapping = true;
        self
    }

    fn apply_options(&self) -> ApplyOptions {
        ApplyOptions {
            all_columns_required: self.strict_mapping,
            use_key_attribute: self.use_key_attribute,
            identity_insert: self.identity_insert,
        }
    }

    fn expect(&self, check: RowCountCheck) -> Option<RowCountCheck> {
        (!self.ignore_rows_affected).then_some(check)
    }

    fn builder(&self, operation: OperationKind) -> TabulaResult<SqlBuilder> {
        let mut builder = self.table.sql_builder();
        builder.apply_argument_value(&self.argument, operation, &self.apply_options())?;
        Ok(builder)
    }

    fn finish(
        &self,
        sql: Sql,
        check: Option<RowCountCheck>,
    ) -> TabulaResult<PreparedStatement> {
        PreparedStatement::render(
            &sql,
            self.source.dialect(),
            self.source.config(),
            self.operation,
            &self.table.name().to_string(),
            check,
        )
    }

    fn prepare_insert(&self, desired: &DesiredColumns) -> TabulaResult<PreparedStatement> {
        let mut builder = self.builder(OperationKind::Insert)?;
        builder.apply_desired_columns(desired)?;
        let stmt = self.insert_statement(&mut builder);
        let sql = self.source.dialect().render_insert(stmt);
        self.finish(sql, self.expect(RowCountCheck::Exactly(1)))
    }

    fn insert_statement(&self, builder: &mut SqlBuilder) -> InsertStatement {
        let columns = builder.build_insert_columns();
        let identity_insert = self.identity_insert
            && self
                .table
                .columns()
                .iter()
                .any(|c| c.is_identity && columns.contains(&c.quoted_name));
        let mut identities = self.table.columns().iter().filter(|c| c.is_identity);
        let generated_key = match (identities.next(), identities.next()) {
            (Some(key), None) => Some(key.quoted_name.clone()),
            _ => None,
        };
        let rows = vec![builder.build_values_clause(None)];
        InsertStatement {
            table: self.table.quoted_name().to_string(),
            columns,
            rows,
            returning: builder.build_select_columns(),
            identity_insert,
            generated_key,
        }
    }

    fn prepare_update(
        &self,
        desired: &DesiredColumns,
        operation: OperationKind,
    ) -> TabulaResult<PreparedStatement> {
        let mut builder = self.builder(OperationKind::Update)?;
        let keys = resolve_keys(self.source, &self.table, &mut builder, &self.keys)?;
        if keys.is_empty() {
            return Err(MappingError::NoUpdateKey {
                table: self.table.name().to_string(),
            }
            .into());
        }
        builder.apply_desired_columns(desired)?;

        let set = builder.build_set_clause()?;
        let filter = builder.build_key_where()?;
        let stmt = UpdateStatement {
            table: self.table.quoted_name().to_string(),
            set,
            filter: Some(filter),
            returning: builder.build_select_columns(),
        };
        let sql = self.source.dialect().render_update(stmt);
        PreparedStatement::render(
            &sql,
            self.source.dialect(),
            self.source.config(),
            operation,
            &self.table.name().to_string(),
            self.expect(RowCountCheck::Exactly(1)),
        )
    }

    fn prepare_delete(&self, desired: &DesiredColumns) -> TabulaResult<PreparedStatement> {
        let mut builder = self.builder(OperationKind::Delete)?;
        let keys = resolve_keys(self.source, &self.table, &mut builder, &self.keys)?;
        if keys.is_empty() {
            return Err(MappingError::NoDeleteKey {
                table: self.table.name().to_string(),
            }
            .into());
        }
        builder.apply_desired_columns(desired)?;

        let filter = builder.build_key_where()?;
        let returning = builder.build_select_columns();
        let dialect = self.source.dialect();
        let policy = self.source.audit_policy();
        let sql = if policy.uses_soft_delete(&self.table) {
            let mut update = soft_delete_rewrite(policy, &self.table, &mut builder, Some(filter))?;
            update.returning = returning;
            dialect.render_update(update)
        } else {
            dialect.render_delete(DeleteStatement {
                table: self.table.quoted_name().to_string(),
                filter: Some(filter),
                returning,
            })
        };
        self.finish(sql, self.expect(RowCountCheck::Exactly(1)))
    }

    /// The branch an upsert of this argument takes.
    pub fn upsert_plan(&self) -> TabulaResult<UpsertPlan> {
        let mut builder = self.builder(OperationKind::Upsert)?;
        let keys = self.upsert_keys(&mut builder)?;
        Ok(Self::plan_for(&builder, &keys, self.identity_insert))
    }

    fn upsert_keys(&self, builder: &mut SqlBuilder) -> TabulaResult<Vec<Arc<ColumnMetadata>>> {
        let keys = resolve_keys(self.source, &self.table, builder, &self.keys)?;
        if keys.is_empty() {
            return Err(MappingError::NoUpdateKey {
                table: self.table.name().to_string(),
            }
            .into());
        }
        Ok(keys)
    }

    fn plan_for(builder: &SqlBuilder, keys: &[Arc<ColumnMetadata>], identity_insert: bool) -> UpsertPlan {
        let identity_key = keys.iter().any(|k| k.is_identity);
        let key_supplied = keys
            .iter()
            .all(|k| builder.column_value(&k.name).is_some_and(|v| !v.is_null()));
        UpsertPlan::decide(identity_key, key_supplied, identity_insert)
    }

    fn prepare_upsert(&self, desired: &DesiredColumns) -> TabulaResult<PreparedStatement> {
        let mut builder = self.builder(OperationKind::Upsert)?;
        let keys = self.upsert_keys(&mut builder)?;

        match Self::plan_for(&builder, &keys, self.identity_insert) {
            UpsertPlan::Insert => {
                tracing::trace!(target: "tabula.sql", table = %self.table.name(), "upsert without key, inserting");
                builder.apply_desired_columns(desired)?;
                let stmt = self.insert_statement(&mut builder);
                let sql = self.source.dialect().render_insert(stmt);
                self.finish(sql, self.expect(RowCountCheck::Exactly(1)))
            }
            UpsertPlan::Update => self.prepare_update(desired, OperationKind::Upsert),
            UpsertPlan::Merge => {
                builder.apply_desired_columns(desired)?;
                let key_columns: Vec<String> = keys.iter().map(|k| k.quoted_name.clone()).collect();
                let columns = builder.build_insert_columns();
                let unbound = keys.iter().find(|k| {
                    !columns.contains(&k.quoted_name)
                        || builder.column_value(&k.name).is_none_or(|v| v.is_null())
                });
                if let Some(key) = unbound {
                    return Err(MappingError::MissingKeyValue {
                        table: self.table.name().to_string(),
                        column: key.name.clone(),
                    }
                    .into());
                }
                let update_columns = builder.build_update_columns();
                let check = if update_columns.is_empty() {
                    None
                } else {
                    self.expect(RowCountCheck::AtLeast(1))
                };
                let identity_insert = self.identity_insert && keys.iter().any(|k| k.is_identity);
                let stmt = UpsertStatement {
                    table: self.table.quoted_name().to_string(),
                    key_columns,
                    columns,
                    values: builder.build_values_clause(None),
                    update_columns,
                    returning: builder.build_select_columns(),
                    identity_insert,
                };
                let sql = self.source.dialect().render_upsert(stmt);
                self.finish(sql, check)
            }
        }
    }
}

impl CommandBuilder for ObjectCommand<'_> {
    fn prepare(&self, desired: &DesiredColumns) -> TabulaResult<PreparedStatement> {
        match self.operation {
            OperationKind::Insert => self.prepare_insert(desired),
            OperationKind::Update => self.prepare_update(desired, OperationKind::Update),
            OperationKind::Delete => self.prepare_delete(desired),
            OperationKind::Upsert => self.prepare_upsert(desired),
            other => Err(self
                .source
                .dialect()
                .unsupported(&format!("{other} as an object command"))
                .into()),
        }
    }
}

impl MutationCommand for ObjectCommand<'_> {
    fn statements(&self) -> TabulaResult<Vec<PreparedStatement>> {
        Ok(vec![self.prepare(&DesiredColumns::NoColumns)?])
    }
}
