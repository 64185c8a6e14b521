use super::column::ColumnMetadata;
use super::foreign_key::ForeignKeyConstraint;
use super::index::IndexMetadata;
use crate::builder::SqlBuilder;
use crate::ident::ObjectName;
use std::sync::{Arc, OnceLock};

/// A table or view.
///
/// Created once per name by the [`SchemaCache`](crate::SchemaCache) and never
/// changed afterwards. Indexes and foreign keys are loaded on first request.
#[derive(Debug)]
pub struct TableOrViewMetadata {
    name: ObjectName,
    quoted_name: String,
    is_table: bool,
    columns: Vec<Arc<ColumnMetadata>>,
    base_table: Option<ObjectName>,
    builder: SqlBuilder,
    pub(crate) indexes: OnceLock<Arc<Vec<IndexMetadata>>>,
    pub(crate) foreign_keys: OnceLock<Arc<Vec<ForeignKeyConstraint>>>,
}

impl TableOrViewMetadata {
    pub(crate) fn new(
        name: ObjectName,
        quoted_name: String,
        is_table: bool,
        columns: Vec<Arc<ColumnMetadata>>,
        base_table: Option<ObjectName>,
        builder: SqlBuilder,
    ) -> Self {
        Self {
            name,
            quoted_name,
            is_table,
            columns,
            base_table,
            builder,
            indexes: OnceLock::new(),
            foreign_keys: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &ObjectName {
        &self.name
    }

    /// The name quoted for the dialect, e.g. `"public"."Customer"`.
    pub fn quoted_name(&self) -> &str {
        &self.quoted_name
    }

    pub fn is_table(&self) -> bool {
        self.is_table
    }

    pub fn is_view(&self) -> bool {
        !self.is_table
    }

    pub fn columns(&self) -> &[Arc<ColumnMetadata>] {
        &self.columns
    }

    /// Look up a column by name, ignoring case.
    pub fn column(&self, name: &str) -> Option<&Arc<ColumnMetadata>> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .or_else(|| self.columns.iter().find(|c| c.matches(name)))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Arc<ColumnMetadata>> {
        self.columns.iter().filter(|c| c.is_primary_key)
    }

    pub fn non_nullable_columns(&self) -> impl Iterator<Item = &Arc<ColumnMetadata>> {
        self.columns.iter().filter(|c| !c.is_nullable)
    }

    /// Underlying table of a view, when known.
    pub fn base_table(&self) -> Option<&ObjectName> {
        self.base_table.as_ref()
    }

    /// A fresh SQL builder cloned from this table's template.
    pub fn sql_builder(&self) -> SqlBuilder {
        self.builder.clone()
    }

    /// Indexes, if they have been loaded through the cache.
    pub fn loaded_indexes(&self) -> Option<&Arc<Vec<IndexMetadata>>> {
        self.indexes.get()
    }
}

/// A user-defined type: a table type or an alias of a built-in type.
#[derive(Debug, Clone)]
pub struct UserDefinedTypeMetadata {
    pub name: ObjectName,
    pub is_table_type: bool,
    pub base_type: Option<String>,
    pub columns: Vec<Arc<ColumnMetadata>>,
}
