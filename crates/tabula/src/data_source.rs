//! The entry point: schema cache, audit policy and settings bundled together.

use crate::audit::{AuditPolicy, NoAuditPolicy};
use crate::builder::OperationKind;
use crate::command::{
    DeleteSetCommand, InsertBatchCommand, KeyTarget, ObjectCommand, RoutineCommand, TableQuery,
    UpdateSetCommand,
};
use crate::config::EngineConfig;
use crate::dialect::Dialect;
use crate::error::TabulaResult;
use crate::mapping::{Argument, Mapped, Record};
use crate::schema_cache::SchemaCache;
use crate::value::Value;
use std::sync::Arc;

/// Builds commands against one database.
///
/// ```ignore
/// use std::sync::Arc;
/// use tabula::prelude::*;
///
/// let cache = SchemaCache::new(Arc::new(PostgresDialect), Arc::new(snapshot));
/// let ds = DataSource::new(Arc::new(cache));
///
/// let stmt = ds
///     .update("Customer", Record::new().with("CustomerKey", 7).with("FullName", "Ada"))?
///     .prepare(&DesiredColumns::NoColumns)?;
/// // UPDATE "public"."Customer" SET "FullName" = $1 WHERE "CustomerKey" = $2
/// ```
#[derive(Debug, Clone)]
pub struct DataSource {
    cache: Arc<SchemaCache>,
    audit: Arc<dyn AuditPolicy>,
    config: EngineConfig,
}

impl DataSource {
    pub fn new(cache: Arc<SchemaCache>) -> Self {
        Self {
            cache,
            audit: Arc::new(NoAuditPolicy),
            config: EngineConfig::default(),
        }
    }

    pub fn with_audit_policy(mut self, policy: Arc<dyn AuditPolicy>) -> Self {
        self.audit = policy;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn cache(&self) -> &Arc<SchemaCache> {
        &self.cache
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.cache.dialect().as_ref()
    }

    pub fn audit_policy(&self) -> &dyn AuditPolicy {
        self.audit.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn object(
        &self,
        table: &str,
        argument: impl Into<Argument>,
        operation: OperationKind,
    ) -> TabulaResult<ObjectCommand<'_>> {
        let table = self.cache.get_table_or_view(table)?;
        Ok(ObjectCommand::new(self, table, argument.into(), operation))
    }

    fn mapped<T: Mapped>(&self, object: &T, operation: OperationKind) -> TabulaResult<ObjectCommand<'_>> {
        let table = self.cache.get_table_or_view_for::<T>()?;
        Ok(ObjectCommand::new(self, table, Argument::Record(object.to_record()), operation))
    }

    // Object commands

    pub fn insert(&self, table: &str, argument: impl Into<Argument>) -> TabulaResult<ObjectCommand<'_>> {
        self.object(table, argument, OperationKind::Insert)
    }

    pub fn update(&self, table: &str, argument: impl Into<Argument>) -> TabulaResult<ObjectCommand<'_>> {
        self.object(table, argument, OperationKind::Update)
    }

    pub fn delete(&self, table: &str, argument: impl Into<Argument>) -> TabulaResult<ObjectCommand<'_>> {
        self.object(table, argument, OperationKind::Delete)
    }

    pub fn upsert(&self, table: &str, argument: impl Into<Argument>) -> TabulaResult<ObjectCommand<'_>> {
        self.object(table, argument, OperationKind::Upsert)
    }

    /// Insert a mapped object into its table.
    pub fn insert_object<T: Mapped>(&self, object: &T) -> TabulaResult<ObjectCommand<'_>> {
        self.mapped(object, OperationKind::Insert)
    }

    pub fn update_object<T: Mapped>(&self, object: &T) -> TabulaResult<ObjectCommand<'_>> {
        Ok(self.mapped(object, OperationKind::Update)?.use_key_attribute())
    }

    pub fn delete_object<T: Mapped>(&self, object: &T) -> TabulaResult<ObjectCommand<'_>> {
        Ok(self.mapped(object, OperationKind::Delete)?.use_key_attribute())
    }

    pub fn upsert_object<T: Mapped>(&self, object: &T) -> TabulaResult<ObjectCommand<'_>> {
        Ok(self.mapped(object, OperationKind::Upsert)?.use_key_attribute())
    }

    // Set commands

    /// Update rows with new values; pick the rows with a filter, a WHERE
    /// clause or `all_rows()`.
    pub fn update_set(&self, table: &str, values: Record) -> TabulaResult<UpdateSetCommand<'_>> {
        let table = self.cache.get_table_or_view(table)?;
        Ok(UpdateSetCommand::new(self, table, values))
    }

    /// Update rows with a raw `SET` expression.
    pub fn update_set_expression(
        &self,
        table: &str,
        expression: &str,
        args: Option<Record>,
    ) -> TabulaResult<UpdateSetCommand<'_>> {
        let table = self.cache.get_table_or_view(table)?;
        Ok(UpdateSetCommand::with_expression(self, table, expression, args))
    }

    pub fn delete_set(&self, table: &str) -> TabulaResult<DeleteSetCommand<'_>> {
        let table = self.cache.get_table_or_view(table)?;
        Ok(DeleteSetCommand::new(self, table))
    }

    // Key commands

    pub fn get_by_key(&self, table: &str, key: impl Into<Value>) -> TabulaResult<TableQuery<'_>> {
        self.get_by_keys(table, KeyTarget::single(key))
    }

    pub fn get_by_key_list<I, V>(&self, table: &str, keys: I) -> TabulaResult<TableQuery<'_>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.get_by_keys(table, KeyTarget::list(keys))
    }

    /// Query by a [`KeyTarget`], e.g. one addressing a unique column.
    pub fn get_by_keys(&self, table: &str, keys: KeyTarget) -> TabulaResult<TableQuery<'_>> {
        let table = self.cache.get_table_or_view(table)?;
        Ok(TableQuery::by_keys(self, table, keys))
    }

    pub fn update_by_key(
        &self,
        table: &str,
        key: impl Into<Value>,
        values: Record,
    ) -> TabulaResult<UpdateSetCommand<'_>> {
        self.update_by_keys(table, KeyTarget::single(key), values)
    }

    pub fn update_by_key_list<I, V>(
        &self,
        table: &str,
        keys: I,
        values: Record,
    ) -> TabulaResult<UpdateSetCommand<'_>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.update_by_keys(table, KeyTarget::list(keys), values)
    }

    pub fn update_by_keys(
        &self,
        table: &str,
        keys: KeyTarget,
        values: Record,
    ) -> TabulaResult<UpdateSetCommand<'_>> {
        let table = self.cache.get_table_or_view(table)?;
        Ok(UpdateSetCommand::by_keys(self, table, keys, values))
    }

    pub fn delete_by_key(&self, table: &str, key: impl Into<Value>) -> TabulaResult<DeleteSetCommand<'_>> {
        self.delete_by_keys(table, KeyTarget::single(key))
    }

    pub fn delete_by_key_list<I, V>(&self, table: &str, keys: I) -> TabulaResult<DeleteSetCommand<'_>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.delete_by_keys(table, KeyTarget::list(keys))
    }

    pub fn delete_by_keys(&self, table: &str, keys: KeyTarget) -> TabulaResult<DeleteSetCommand<'_>> {
        let table = self.cache.get_table_or_view(table)?;
        Ok(DeleteSetCommand::by_keys(self, table, keys))
    }

    // Batch

    pub fn insert_batch(&self, table: &str, rows: Vec<Record>) -> TabulaResult<InsertBatchCommand<'_>> {
        let table = self.cache.get_table_or_view(table)?;
        Ok(InsertBatchCommand::new(self, table, rows))
    }

    /// Insert mapped objects into their table.
    pub fn insert_batch_objects<T: Mapped>(&self, objects: &[T]) -> TabulaResult<InsertBatchCommand<'_>> {
        let table = self.cache.get_table_or_view_for::<T>()?;
        let rows = objects.iter().map(Mapped::to_record).collect();
        Ok(InsertBatchCommand::new(self, table, rows))
    }

    // Routines

    pub fn procedure(&self, name: &str) -> TabulaResult<RoutineCommand<'_>> {
        let routine = self.cache.get_stored_procedure(name)?;
        Ok(RoutineCommand::new(self, routine))
    }

    pub fn scalar_function(&self, name: &str) -> TabulaResult<RoutineCommand<'_>> {
        let routine = self.cache.get_scalar_function(name)?;
        Ok(RoutineCommand::new(self, routine))
    }

    /// Query a table function; filters, sorting and limits apply to its
    /// result columns.
    pub fn table_function(
        &self,
        name: &str,
        argument: Option<Argument>,
    ) -> TabulaResult<TableQuery<'_>> {
        let routine = self.cache.get_table_function(name)?;
        let mut call = RoutineCommand::new(self, routine);
        if let Some(argument) = argument {
            call = call.with_argument(argument);
        }
        Ok(TableQuery::function(self, call))
    }

    // Queries

    pub fn from(&self, table: &str) -> TabulaResult<TableQuery<'_>> {
        let table = self.cache.get_table_or_view(table)?;
        Ok(TableQuery::table(self, table))
    }

    /// Query a mapped type's table.
    pub fn from_mapped<T: Mapped>(&self) -> TabulaResult<TableQuery<'_>> {
        let table = self.cache.get_table_or_view_for::<T>()?;
        Ok(TableQuery::table(self, table))
    }
}
