//! Per-data-source cache of resolved schema metadata.

use crate::builder::SqlBuilder;
use crate::dialect::{Dialect, base_type_name};
use crate::error::{MappingError, ObjectKind, SchemaError, TabulaError, TabulaResult};
use crate::ident::ObjectName;
use crate::mapping::{ClassMapping, Mapped, registered_mappings};
use crate::metadata::{
    ColumnDef, ColumnMetadata, ForeignKeyConstraint, IndexMetadata, MetadataSource,
    ParameterMetadata, RoutineDef, RoutineKind, RoutineMetadata, TableDef, TableOrViewMetadata,
    UserDefinedTypeDef, UserDefinedTypeMetadata,
};
use crate::types::{ClrType, TypeRegistry};
use crate::value::{Value, ValueKind};
use heck::ToSnakeCase;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct CacheMaps {
    /// Bumped by every reset; loads started under an older generation are
    /// returned to their caller but never published.
    generation: u64,
    tables: HashMap<String, Arc<TableOrViewMetadata>>,
    routines: HashMap<(RoutineKind, String), Arc<RoutineMetadata>>,
    types: HashMap<String, Arc<UserDefinedTypeMetadata>>,
    mappings: HashMap<String, Arc<TableOrViewMetadata>>,
}

/// Lazily loaded, memoized metadata for one database.
///
/// Lookups take a read lock; a miss loads from the [`MetadataSource`]
/// without holding any lock and then publishes under a write lock. When two
/// threads load the same object, the first published value wins and both
/// callers get it.
pub struct SchemaCache {
    dialect: Arc<dyn Dialect>,
    source: Arc<dyn MetadataSource>,
    types: Arc<TypeRegistry>,
    inner: RwLock<CacheMaps>,
}

impl fmt::Debug for SchemaCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("SchemaCache")
            .field("dialect", &self.dialect.name())
            .field("generation", &inner.generation)
            .field("tables", &inner.tables.len())
            .field("routines", &inner.routines.len())
            .field("types", &inner.types.len())
            .finish()
    }
}

impl SchemaCache {
    pub fn new(dialect: Arc<dyn Dialect>, source: Arc<dyn MetadataSource>) -> Self {
        Self::with_type_registry(dialect, source, Arc::new(TypeRegistry::new()))
    }

    /// Share a type registry between several caches.
    pub fn with_type_registry(
        dialect: Arc<dyn Dialect>,
        source: Arc<dyn MetadataSource>,
        types: Arc<TypeRegistry>,
    ) -> Self {
        Self {
            dialect,
            source,
            types,
            inner: RwLock::new(CacheMaps::default()),
        }
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    pub fn type_registry(&self) -> &Arc<TypeRegistry> {
        &self.types
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, CacheMaps> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, CacheMaps> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    fn cache_key(&self, name: &ObjectName) -> String {
        name.or_schema(self.dialect.default_schema()).key()
    }

    fn lookup<K, V>(&self, select: impl FnOnce(&CacheMaps) -> &HashMap<K, Arc<V>>, key: &K) -> Result<Arc<V>, u64>
    where
        K: Eq + Hash,
    {
        let inner = self.read();
        match select(&inner).get(key) {
            Some(found) => Ok(Arc::clone(found)),
            None => Err(inner.generation),
        }
    }

    fn publish<K, V>(
        &self,
        generation: u64,
        select: impl FnOnce(&mut CacheMaps) -> &mut HashMap<K, Arc<V>>,
        key: K,
        value: Arc<V>,
    ) -> Arc<V>
    where
        K: Eq + Hash,
    {
        let mut inner = self.write();
        if inner.generation != generation {
            return value;
        }
        Arc::clone(select(&mut inner).entry(key).or_insert(value))
    }

    // ------------------------------------------------------------------
    // Tables and views
    // ------------------------------------------------------------------

    /// Resolve a table or view by name, e.g. `Customer`, `sales.Customer` or
    /// `[sales].[Customer]`.
    pub fn get_table_or_view(&self, name: &str) -> TabulaResult<Arc<TableOrViewMetadata>> {
        let name = self.dialect.parse_object_name(name)?;
        self.get_table_or_view_named(&name)
    }

    pub fn get_table_or_view_named(&self, name: &ObjectName) -> TabulaResult<Arc<TableOrViewMetadata>> {
        let key = self.cache_key(name);
        let generation = match self.lookup(|m| &m.tables, &key) {
            Ok(found) => return Ok(found),
            Err(generation) => generation,
        };

        let def = self
            .source
            .load_table(name)?
            .ok_or_else(|| SchemaError::not_found(ObjectKind::TableOrView, name.to_string()))?;
        let table = Arc::new(self.build_table(&def)?);
        tracing::debug!(
            target: "tabula.schema",
            table = %table.name(),
            columns = table.columns().len(),
            view = table.is_view(),
            "loaded table metadata"
        );
        Ok(self.publish(generation, |m| &mut m.tables, key, table))
    }

    fn build_table(&self, def: &TableDef) -> TabulaResult<TableOrViewMetadata> {
        let name = def.object_name().or_schema(self.dialect.default_schema());
        if def.columns.is_empty() {
            return Err(SchemaError::InvalidMetadata {
                object: name.to_string(),
                message: "no columns".to_string(),
            }
            .into());
        }
        let columns = self.build_columns(&def.columns);
        let base_table = def
            .base_table
            .as_deref()
            .map(|b| self.dialect.parse_object_name(b))
            .transpose()?;
        let builder = SqlBuilder::new(Arc::clone(&self.dialect), name.to_string(), &columns, &[]);
        let quoted_name = self.dialect.quote_object_name(&name);
        Ok(TableOrViewMetadata::new(
            name,
            quoted_name,
            !def.is_view,
            columns,
            base_table,
            builder,
        ))
    }

    fn build_columns(&self, defs: &[ColumnDef]) -> Vec<Arc<ColumnMetadata>> {
        defs.iter()
            .map(|c| {
                let kind = self.resolve_kind(&c.native_type, c.max_length, c.is_unsigned);
                Arc::new(ColumnMetadata::from_def(c, self.dialect.as_ref(), kind))
            })
            .collect()
    }

    /// Resolve the table a mapped type targets.
    pub fn get_table_or_view_for<T: Mapped>(&self) -> TabulaResult<Arc<TableOrViewMetadata>> {
        self.get_table_or_view_for_mapping(&T::mapping())
    }

    /// Resolve a class mapping's table.
    ///
    /// An explicit table name is used as is. Otherwise the type name is tried
    /// as written, in snake_case, and in plural and singular forms of both.
    pub fn get_table_or_view_for_mapping(
        &self,
        mapping: &ClassMapping,
    ) -> TabulaResult<Arc<TableOrViewMetadata>> {
        if let Some(table) = &mapping.table {
            return self.get_table_or_view(table);
        }

        let key = mapping.type_name.to_lowercase();
        let generation = match self.lookup(|m| &m.mappings, &key) {
            Ok(found) => return Ok(found),
            Err(generation) => generation,
        };

        let candidates = mapping_candidates(&mapping.type_name);
        for candidate in &candidates {
            let name = ObjectName::new(None, candidate.clone());
            match self.get_table_or_view_named(&name) {
                Ok(table) => {
                    tracing::debug!(
                        target: "tabula.schema",
                        type_name = %mapping.type_name,
                        table = %table.name(),
                        "resolved mapping by convention"
                    );
                    return Ok(self.publish(generation, |m| &mut m.mappings, key, table));
                }
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }
        Err(SchemaError::AmbiguousMapping {
            type_name: mapping.type_name.clone(),
            candidates,
        }
        .into())
    }

    /// Resolve every mapping registered by `#[derive(Mapped)]`.
    ///
    /// Returns the failures by type name; an empty list means every mapped
    /// type has a table and every declared column exists on it.
    pub fn validate_registered_mappings(&self) -> Vec<(&'static str, TabulaError)> {
        let mut failures = Vec::new();
        for registration in registered_mappings() {
            let mapping = (registration.mapping)();
            if let Err(e) = self.validate_mapping(&mapping) {
                failures.push((registration.type_name, e));
            }
        }
        tracing::info!(
            target: "tabula.schema",
            failures = failures.len(),
            "validated registered mappings"
        );
        failures
    }

    fn validate_mapping(&self, mapping: &ClassMapping) -> TabulaResult<()> {
        let table = self.get_table_or_view_for_mapping(mapping)?;
        for field in &mapping.fields {
            if let Some(column) = &field.column {
                if !table.has_column(column) {
                    return Err(MappingError::ColumnNotMapped {
                        table: table.name().to_string(),
                        column: column.clone(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Indexes of a table, loaded on first request.
    pub fn get_indexes(&self, table: &str) -> TabulaResult<Arc<Vec<IndexMetadata>>> {
        let table = self.get_table_or_view(table)?;
        if let Some(indexes) = table.indexes.get() {
            return Ok(Arc::clone(indexes));
        }
        let indexes: Vec<IndexMetadata> = self
            .source
            .load_indexes(table.name())?
            .iter()
            .map(IndexMetadata::from)
            .collect();
        Ok(Arc::clone(table.indexes.get_or_init(|| Arc::new(indexes))))
    }

    /// Foreign keys owned by a table, loaded on first request.
    pub fn get_foreign_keys(&self, table: &str) -> TabulaResult<Arc<Vec<ForeignKeyConstraint>>> {
        let table = self.get_table_or_view(table)?;
        if let Some(keys) = table.foreign_keys.get() {
            return Ok(Arc::clone(keys));
        }
        let keys = self
            .source
            .load_foreign_keys(table.name())?
            .iter()
            .map(|def| ForeignKeyConstraint::from_def(def, table.name()))
            .collect::<TabulaResult<Vec<_>>>()?;
        Ok(Arc::clone(table.foreign_keys.get_or_init(|| Arc::new(keys))))
    }

    // ------------------------------------------------------------------
    // Routines and user-defined types
    // ------------------------------------------------------------------

    pub fn get_stored_procedure(&self, name: &str) -> TabulaResult<Arc<RoutineMetadata>> {
        self.get_routine(name, RoutineKind::StoredProcedure)
    }

    pub fn get_scalar_function(&self, name: &str) -> TabulaResult<Arc<RoutineMetadata>> {
        self.get_routine(name, RoutineKind::ScalarFunction)
    }

    pub fn get_table_function(&self, name: &str) -> TabulaResult<Arc<RoutineMetadata>> {
        self.get_routine(name, RoutineKind::TableFunction)
    }

    fn get_routine(&self, name: &str, kind: RoutineKind) -> TabulaResult<Arc<RoutineMetadata>> {
        if !self.dialect.supports_routine(kind) {
            return Err(self.dialect.unsupported(&format!("{kind}s")).into());
        }
        let name = self.dialect.parse_object_name(name)?;
        let key = (kind, self.cache_key(&name));
        let generation = match self.lookup(|m| &m.routines, &key) {
            Ok(found) => return Ok(found),
            Err(generation) => generation,
        };

        let def = self
            .source
            .load_routine(&name, kind)?
            .ok_or_else(|| SchemaError::not_found(routine_object_kind(kind), name.to_string()))?;
        let routine = Arc::new(self.build_routine(&def));
        tracing::debug!(
            target: "tabula.schema",
            routine = %routine.name(),
            kind = %kind,
            parameters = routine.parameters().len(),
            "loaded routine metadata"
        );
        Ok(self.publish(generation, |m| &mut m.routines, key, routine))
    }

    fn build_routine(&self, def: &RoutineDef) -> RoutineMetadata {
        let name = def.object_name().or_schema(self.dialect.default_schema());
        let parameters: Vec<Arc<ParameterMetadata>> = def
            .parameters
            .iter()
            .map(|p| {
                let kind = self.resolve_kind(&p.native_type, p.max_length, false);
                Arc::new(ParameterMetadata::from_def(p, kind))
            })
            .collect();
        let columns = self.build_columns(&def.columns);
        let builder = SqlBuilder::new(Arc::clone(&self.dialect), name.to_string(), &columns, &parameters);
        RoutineMetadata::new(name, def.kind, parameters, columns, def.return_type.clone(), builder)
    }

    pub fn get_user_defined_type(&self, name: &str) -> TabulaResult<Arc<UserDefinedTypeMetadata>> {
        let name = self.dialect.parse_object_name(name)?;
        let key = self.cache_key(&name);
        let generation = match self.lookup(|m| &m.types, &key) {
            Ok(found) => return Ok(found),
            Err(generation) => generation,
        };

        let def = self
            .source
            .load_user_defined_type(&name)?
            .ok_or_else(|| SchemaError::not_found(ObjectKind::UserDefinedType, name.to_string()))?;
        let udt = Arc::new(self.build_user_defined_type(&def));
        Ok(self.publish(generation, |m| &mut m.types, key, udt))
    }

    fn build_user_defined_type(&self, def: &UserDefinedTypeDef) -> UserDefinedTypeMetadata {
        UserDefinedTypeMetadata {
            name: def.object_name().or_schema(self.dialect.default_schema()),
            is_table_type: def.is_table_type,
            base_type: def.base_type.clone(),
            columns: self.build_columns(&def.columns),
        }
    }

    // ------------------------------------------------------------------
    // Preload and reset
    // ------------------------------------------------------------------

    /// Load every object the source lists. Returns the number loaded.
    pub fn preload(&self) -> TabulaResult<usize> {
        let mut count = self.preload_tables()?;
        count += self.preload_procedures()?;
        count += self.preload_scalar_functions()?;
        count += self.preload_table_functions()?;
        count += self.preload_user_defined_types()?;
        tracing::info!(target: "tabula.schema", objects = count, "preloaded schema");
        Ok(count)
    }

    pub fn preload_tables(&self) -> TabulaResult<usize> {
        let names = self.source.list_tables()?;
        for name in &names {
            self.get_table_or_view_named(name)?;
        }
        Ok(names.len())
    }

    pub fn preload_procedures(&self) -> TabulaResult<usize> {
        self.preload_routines(RoutineKind::StoredProcedure)
    }

    pub fn preload_scalar_functions(&self) -> TabulaResult<usize> {
        self.preload_routines(RoutineKind::ScalarFunction)
    }

    pub fn preload_table_functions(&self) -> TabulaResult<usize> {
        self.preload_routines(RoutineKind::TableFunction)
    }

    fn preload_routines(&self, kind: RoutineKind) -> TabulaResult<usize> {
        if !self.dialect.supports_routine(kind) {
            return Ok(0);
        }
        let names = self.source.list_routines(kind)?;
        for name in &names {
            self.get_routine(&name.to_string(), kind)?;
        }
        Ok(names.len())
    }

    pub fn preload_user_defined_types(&self) -> TabulaResult<usize> {
        let names = self.source.list_user_defined_types()?;
        for name in &names {
            self.get_user_defined_type(&name.to_string())?;
        }
        Ok(names.len())
    }

    /// Drop every cached entry.
    ///
    /// Loads in flight when the reset happens still return to their callers
    /// but are not cached.
    pub fn reset(&self) {
        let mut inner = self.write();
        inner.generation += 1;
        inner.tables.clear();
        inner.routines.clear();
        inner.types.clear();
        inner.mappings.clear();
        tracing::info!(target: "tabula.schema", generation = inner.generation, "schema cache reset");
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    /// Map a native type to a value kind for columns loaded from now on.
    pub fn register_type(&self, native_type: &str, kind: ValueKind) {
        let previous = self.types.register(native_type, kind);
        tracing::debug!(
            target: "tabula.schema",
            native_type,
            kind = %kind,
            replaced = previous.is_some(),
            "registered type"
        );
    }

    pub fn unregister_type(&self, native_type: &str) -> bool {
        let removed = self.types.unregister(native_type).is_some();
        tracing::debug!(target: "tabula.schema", native_type, removed, "unregistered type");
        removed
    }

    fn resolve_kind(&self, native_type: &str, max_length: Option<i32>, is_unsigned: bool) -> Option<ValueKind> {
        self.types
            .get(native_type)
            .or_else(|| self.types.get(&base_type_name(native_type)))
            .or_else(|| self.dialect.native_type_kind(native_type, max_length, is_unsigned))
    }

    /// Host-side type of a native type: registered overrides first, then
    /// the dialect's table. Unknown types yield `None`.
    pub fn to_value_kind(
        &self,
        native_type: &str,
        is_nullable: bool,
        max_length: Option<i32>,
        is_unsigned: bool,
    ) -> Option<ClrType> {
        self.resolve_kind(native_type, max_length, is_unsigned)
            .map(|kind| ClrType::new(kind, is_nullable))
    }

    /// Render `value` as an inline literal, converting it to `native_type`'s
    /// kind first when that type is known.
    pub fn value_to_sql_value(&self, value: &Value, native_type: Option<&str>) -> TabulaResult<String> {
        let kind = native_type.and_then(|t| self.resolve_kind(t, None, false));
        let value = match kind {
            Some(kind) if !value.is_null() => value.coerce_to(kind).map_err(|message| MappingError::TypeCoercion {
                column: native_type.unwrap_or_default().to_string(),
                expected: kind.to_string(),
                found: value.type_name().to_string(),
                message,
            })?,
            _ => value.clone(),
        };
        self.dialect.literal(&value)
    }
}

fn routine_object_kind(kind: RoutineKind) -> ObjectKind {
    match kind {
        RoutineKind::StoredProcedure => ObjectKind::StoredProcedure,
        RoutineKind::ScalarFunction => ObjectKind::ScalarFunction,
        RoutineKind::TableFunction => ObjectKind::TableFunction,
    }
}

/// Table names tried for a type without an explicit table, in order.
pub(crate) fn mapping_candidates(type_name: &str) -> Vec<String> {
    let base = type_name.rsplit("::").next().unwrap_or(type_name);
    let snake = base.to_snake_case();

    let mut out: Vec<String> = Vec::new();
    for name in [base.to_string(), snake] {
        for candidate in [name.clone(), plural(&name), singular(&name)] {
            if !out.iter().any(|c| c.eq_ignore_ascii_case(&candidate)) {
                out.push(candidate);
            }
        }
    }
    out
}

fn plural(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if let Some(stem) = word.strip_suffix(['y', 'Y']) {
        if !["ay", "ey", "oy", "uy"].iter().any(|s| lower.ends_with(s)) {
            return format!("{stem}ies");
        }
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        format!("{word}es")
    } else {
        format!("{word}s")
    }
}

fn singular(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    let strip = |n: usize| word.get(..word.len() - n).unwrap_or(word).to_string();
    if lower.ends_with("ies") && word.len() > 3 {
        format!("{}y", strip(3))
    } else if ["sses", "xes", "zes", "ches", "shes"].iter().any(|s| lower.ends_with(s)) {
        strip(2)
    } else if lower.ends_with('s') && !lower.ends_with("ss") && word.len() > 1 {
        strip(1)
    } else {
        word.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{PostgresDialect, SqlServerDialect};
    use crate::metadata::{ColumnDef, IndexDef, ParameterDef, SchemaSnapshot, TableDef};

    fn snapshot() -> SchemaSnapshot {
        SchemaSnapshot::new()
            .with_default_schema("dbo")
            .table(
                TableDef::table("dbo.Customer")
                    .column(ColumnDef::new("CustomerKey", "int").primary_key().identity())
                    .column(ColumnDef::new("FullName", "nvarchar").max_length(100))
                    .column(ColumnDef::new("Balance", "money").nullable()),
            )
            .table(
                TableDef::table("dbo.order_lines")
                    .column(ColumnDef::new("Id", "int").primary_key())
                    .column(ColumnDef::new("Sku", "varchar")),
            )
            .routine(
                RoutineDef::new("dbo.GetCustomer", RoutineKind::StoredProcedure)
                    .parameter(ParameterDef::new("@CustomerKey", "int")),
            )
    }

    fn cache() -> SchemaCache {
        SchemaCache::new(Arc::new(SqlServerDialect), Arc::new(snapshot()))
    }

    #[test]
    fn tables_are_cached_by_case_insensitive_name() {
        let cache = cache();
        let a = cache.get_table_or_view("Customer").unwrap();
        let b = cache.get_table_or_view("[dbo].[CUSTOMER]").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.quoted_name(), "[dbo].[Customer]");
        assert_eq!(a.columns()[2].kind, Some(ValueKind::Decimal));
    }

    #[test]
    fn missing_table_is_not_found() {
        let err = cache().get_table_or_view("Nope").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn reset_drops_entries() {
        let cache = cache();
        let a = cache.get_table_or_view("Customer").unwrap();
        cache.reset();
        let b = cache.get_table_or_view("Customer").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn stale_generation_is_not_published() {
        let cache = cache();
        let generation = cache.read().generation;
        let table = Arc::new(
            cache
                .build_table(&TableDef::table("dbo.Ghost").column(ColumnDef::new("Id", "int")))
                .unwrap(),
        );
        cache.reset();
        let returned = cache.publish(generation, |m| &mut m.tables, "dbo.ghost".to_string(), table);
        assert_eq!(returned.name().name(), "Ghost");
        assert!(cache.read().tables.is_empty());
    }

    #[test]
    fn registered_types_override_the_dialect() {
        let cache = cache();
        assert_eq!(
            cache.to_value_kind("money", true, None, false),
            Some(ClrType::new(ValueKind::Decimal, true))
        );
        cache.register_type("money", ValueKind::F64);
        assert_eq!(
            cache.to_value_kind("MONEY", false, None, false),
            Some(ClrType::new(ValueKind::F64, false))
        );
        assert!(cache.unregister_type("money"));
        assert_eq!(cache.to_value_kind("geography", false, None, false), None);
    }

    #[test]
    fn mapping_resolves_by_convention() {
        let cache = cache();
        let table = cache
            .get_table_or_view_for_mapping(&ClassMapping::new("app::OrderLine"))
            .unwrap();
        assert_eq!(table.name().name(), "order_lines");

        let err = cache
            .get_table_or_view_for_mapping(&ClassMapping::new("Invoice"))
            .unwrap_err();
        assert!(matches!(err, TabulaError::Schema(SchemaError::AmbiguousMapping { .. })));
    }

    #[test]
    fn candidates_cover_plural_and_snake_case() {
        let c = mapping_candidates("Category");
        assert_eq!(c, ["Category", "Categories"]);
        assert_eq!(
            mapping_candidates("app::OrderLine"),
            ["OrderLine", "OrderLines", "order_line", "order_lines"]
        );
        assert!(mapping_candidates("Boxes").contains(&"Box".to_string()));
    }

    #[test]
    fn routines_load_and_respect_dialect_support() {
        let cache = cache();
        let proc = cache.get_stored_procedure("GetCustomer").unwrap();
        assert_eq!(proc.parameters()[0].variable_name, "CustomerKey");

        let sqlite = SchemaCache::new(Arc::new(crate::dialect::SqliteDialect), Arc::new(snapshot()));
        assert!(sqlite.get_stored_procedure("GetCustomer").unwrap_err().is_unsupported());
    }

    #[test]
    fn indexes_and_foreign_keys_load_on_demand() {
        let snapshot = snapshot().table(
            TableDef::table("dbo.Invoice")
                .column(ColumnDef::new("Id", "int").primary_key())
                .column(ColumnDef::new("CustomerKey", "int"))
                .index(IndexDef::new("PK_Invoice", &["Id"]).primary_key())
                .index(IndexDef::new("IX_Invoice_Customer", &["CustomerKey"]))
                .foreign_key("FK_Invoice_Customer", &["CustomerKey"], "dbo.Customer", &["CustomerKey"]),
        );
        let cache = SchemaCache::new(Arc::new(SqlServerDialect), Arc::new(snapshot));

        let indexes = cache.get_indexes("Invoice").unwrap();
        assert_eq!(indexes.len(), 2);
        assert!(indexes[0].is_primary_key);
        assert!(Arc::ptr_eq(&indexes, &cache.get_indexes("dbo.Invoice").unwrap()));

        let fks = cache.get_foreign_keys("Invoice").unwrap();
        assert_eq!(fks[0].name(), "FK_Invoice_Customer");
        assert_eq!(fks[0].parent_table().name(), "Customer");
        assert_eq!(fks[0].column_pairs().collect::<Vec<_>>(), [("CustomerKey", "CustomerKey")]);
    }

    #[test]
    fn preload_loads_everything_listed() {
        let snapshot = snapshot().user_defined_type(UserDefinedTypeDef {
            schema: Some("dbo".into()),
            name: "KeyList".into(),
            is_table_type: true,
            base_type: None,
            columns: vec![ColumnDef::new("Key", "int")],
        });
        let cache = SchemaCache::new(Arc::new(SqlServerDialect), Arc::new(snapshot));

        // two tables, one procedure, one table type
        assert_eq!(cache.preload().unwrap(), 4);
        assert_eq!(cache.read().tables.len(), 2);
        assert_eq!(cache.read().routines.len(), 1);

        let udt = cache.get_user_defined_type("KeyList").unwrap();
        assert!(udt.is_table_type);
        assert_eq!(udt.columns.len(), 1);
    }

    #[test]
    fn literals_follow_the_dialect() {
        let cache = SchemaCache::new(Arc::new(PostgresDialect), Arc::new(SchemaSnapshot::new()));
        assert_eq!(cache.value_to_sql_value(&Value::from("O'Brien"), None).unwrap(), "'O''Brien'");
        assert_eq!(cache.value_to_sql_value(&Value::from("42"), Some("int4")).unwrap(), "42");
        assert_eq!(cache.value_to_sql_value(&Value::Null, Some("int4")).unwrap(), "NULL");
        assert_eq!(cache.value_to_sql_value(&Value::Bool(true), None).unwrap(), "TRUE");
    }
}
