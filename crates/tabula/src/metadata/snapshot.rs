//! Raw schema definitions and the sources that provide them.
//!
//! Definitions (`*Def`) are plain, serializable descriptions of database
//! objects as a catalog reports them. The [`SchemaCache`](crate::SchemaCache)
//! resolves them into immutable metadata for one dialect.

use super::routine::{ParameterDirection, RoutineKind};
use crate::error::TabulaResult;
use crate::ident::ObjectName;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub native_type: String,
    #[serde(default)]
    pub is_nullable: bool,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_identity: bool,
    #[serde(default)]
    pub is_computed: bool,
    #[serde(default)]
    pub max_length: Option<i32>,
    #[serde(default)]
    pub precision: Option<i32>,
    #[serde(default)]
    pub scale: Option<i32>,
    #[serde(default)]
    pub is_unsigned: bool,
}

impl ColumnDef {
    /// A non-nullable column of the given native type.
    pub fn new(name: impl Into<String>, native_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            native_type: native_type.into(),
            is_nullable: false,
            is_primary_key: false,
            is_identity: false,
            is_computed: false,
            max_length: None,
            precision: None,
            scale: None,
            is_unsigned: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    pub fn identity(mut self) -> Self {
        self.is_identity = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.is_computed = true;
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.is_unsigned = true;
        self
    }

    pub fn max_length(mut self, len: i32) -> Self {
        self.max_length = Some(len);
        self
    }

    pub fn precision(mut self, precision: i32, scale: i32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexColumnDef {
    pub name: String,
    #[serde(default)]
    pub is_descending: bool,
    #[serde(default)]
    pub is_included: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
    pub name: String,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default)]
    pub is_unique_constraint: bool,
    pub columns: Vec<IndexColumnDef>,
    #[serde(default)]
    pub size_kb: Option<i64>,
    #[serde(default)]
    pub row_count: Option<i64>,
}

impl IndexDef {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            is_primary_key: false,
            is_unique: false,
            is_unique_constraint: false,
            columns: columns
                .iter()
                .map(|c| IndexColumnDef {
                    name: c.to_string(),
                    is_descending: false,
                    is_included: false,
                })
                .collect(),
            size_kb: None,
            row_count: None,
        }
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.is_unique = true;
        self
    }
}

/// A foreign key owned by the child (referencing) table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDef {
    pub name: String,
    pub parent_table: String,
    pub parent_columns: Vec<String>,
    pub child_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    #[serde(default)]
    pub schema: Option<String>,
    pub name: String,
    #[serde(default)]
    pub is_view: bool,
    /// Underlying table of a view, used for key fallback.
    #[serde(default)]
    pub base_table: Option<String>,
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub indexes: Vec<IndexDef>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDef>,
}

impl TableDef {
    pub fn table(name: &str) -> Self {
        Self::new(name, false)
    }

    pub fn view(name: &str) -> Self {
        Self::new(name, true)
    }

    fn new(name: &str, is_view: bool) -> Self {
        let (schema, name) = split_name(name);
        Self {
            schema,
            name,
            is_view,
            base_table: None,
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn base_table(mut self, table: impl Into<String>) -> Self {
        self.base_table = Some(table.into());
        self
    }

    pub fn index(mut self, index: IndexDef) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn foreign_key(
        mut self,
        name: impl Into<String>,
        child_columns: &[&str],
        parent_table: impl Into<String>,
        parent_columns: &[&str],
    ) -> Self {
        self.foreign_keys.push(ForeignKeyDef {
            name: name.into(),
            parent_table: parent_table.into(),
            parent_columns: parent_columns.iter().map(|c| c.to_string()).collect(),
            child_columns: child_columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn object_name(&self) -> ObjectName {
        ObjectName::new(self.schema.as_deref(), self.name.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDef {
    /// Name as declared, e.g. `@CustomerKey` or `p_customer_key`.
    pub name: String,
    pub native_type: String,
    #[serde(default = "default_true")]
    pub is_nullable: bool,
    #[serde(default)]
    pub max_length: Option<i32>,
    #[serde(default)]
    pub precision: Option<i32>,
    #[serde(default)]
    pub scale: Option<i32>,
    #[serde(default)]
    pub direction: ParameterDirection,
}

fn default_true() -> bool {
    true
}

impl ParameterDef {
    pub fn new(name: impl Into<String>, native_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            native_type: native_type.into(),
            is_nullable: true,
            max_length: None,
            precision: None,
            scale: None,
            direction: ParameterDirection::In,
        }
    }

    pub fn direction(mut self, direction: ParameterDirection) -> Self {
        self.direction = direction;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineDef {
    #[serde(default)]
    pub schema: Option<String>,
    pub name: String,
    pub kind: RoutineKind,
    #[serde(default)]
    pub parameters: Vec<ParameterDef>,
    /// Result columns (table functions).
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
    /// Return type (scalar functions).
    #[serde(default)]
    pub return_type: Option<String>,
}

impl RoutineDef {
    pub fn new(name: &str, kind: RoutineKind) -> Self {
        let (schema, name) = split_name(name);
        Self {
            schema,
            name,
            kind,
            parameters: Vec::new(),
            columns: Vec::new(),
            return_type: None,
        }
    }

    pub fn parameter(mut self, parameter: ParameterDef) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn returns(mut self, native_type: impl Into<String>) -> Self {
        self.return_type = Some(native_type.into());
        self
    }

    pub fn object_name(&self) -> ObjectName {
        ObjectName::new(self.schema.as_deref(), self.name.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDefinedTypeDef {
    #[serde(default)]
    pub schema: Option<String>,
    pub name: String,
    #[serde(default)]
    pub is_table_type: bool,
    /// Underlying type of an alias/domain type.
    #[serde(default)]
    pub base_type: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
}

impl UserDefinedTypeDef {
    pub fn object_name(&self) -> ObjectName {
        ObjectName::new(self.schema.as_deref(), self.name.clone())
    }
}

/// Where the [`SchemaCache`](crate::SchemaCache) loads definitions from.
///
/// Lookups are case-insensitive. An unqualified name should resolve in the
/// source's default schema first, then in any schema.
pub trait MetadataSource: Send + Sync {
    fn load_table(&self, name: &ObjectName) -> TabulaResult<Option<TableDef>>;

    fn load_routine(&self, name: &ObjectName, kind: RoutineKind) -> TabulaResult<Option<RoutineDef>>;

    fn load_user_defined_type(&self, name: &ObjectName) -> TabulaResult<Option<UserDefinedTypeDef>>;

    fn load_indexes(&self, table: &ObjectName) -> TabulaResult<Vec<IndexDef>>;

    fn load_foreign_keys(&self, table: &ObjectName) -> TabulaResult<Vec<ForeignKeyDef>>;

    fn list_tables(&self) -> TabulaResult<Vec<ObjectName>>;

    fn list_routines(&self, kind: RoutineKind) -> TabulaResult<Vec<ObjectName>>;

    fn list_user_defined_types(&self) -> TabulaResult<Vec<ObjectName>>;
}

/// An in-memory [`MetadataSource`], buildable in code or loaded from JSON.
///
/// ```ignore
/// let snapshot = SchemaSnapshot::new()
///     .table(TableDef::table("Customer")
///         .column(ColumnDef::new("Id", "int").primary_key().identity())
///         .column(ColumnDef::new("Name", "nvarchar").max_length(100)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    #[serde(default)]
    pub default_schema: Option<String>,
    #[serde(default)]
    pub tables: Vec<TableDef>,
    #[serde(default)]
    pub routines: Vec<RoutineDef>,
    #[serde(default)]
    pub types: Vec<UserDefinedTypeDef>,
}

impl SchemaSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = Some(schema.into());
        self
    }

    pub fn table(mut self, table: TableDef) -> Self {
        self.tables.push(table);
        self
    }

    pub fn routine(mut self, routine: RoutineDef) -> Self {
        self.routines.push(routine);
        self
    }

    pub fn user_defined_type(mut self, udt: UserDefinedTypeDef) -> Self {
        self.types.push(udt);
        self
    }

    pub fn from_json(json: &str) -> TabulaResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| crate::TabulaError::config(format!("invalid schema snapshot: {e}")))
    }

    pub fn to_json(&self) -> TabulaResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| crate::TabulaError::config(format!("cannot serialize schema snapshot: {e}")))
    }

    /// Pick the best match for `name`: exact schema, else the default schema, else any.
    fn find<'a, T>(
        &self,
        items: impl Iterator<Item = &'a T>,
        name: &ObjectName,
        object_name: impl Fn(&T) -> ObjectName,
    ) -> Option<&'a T> {
        let candidates: Vec<&T> = items.filter(|t| object_name(*t).matches(name)).collect();
        if name.schema().is_some() || candidates.len() <= 1 {
            return candidates.into_iter().next();
        }
        let default = self.default_schema.as_deref();
        candidates
            .iter()
            .copied()
            .find(|t| {
                let n = object_name(*t);
                match (n.schema(), default) {
                    (Some(s), Some(d)) => s.eq_ignore_ascii_case(d),
                    (None, _) => true,
                    _ => false,
                }
            })
            .or_else(|| candidates.first().copied())
    }

    fn find_table(&self, name: &ObjectName) -> Option<&TableDef> {
        self.find(self.tables.iter(), name, TableDef::object_name)
    }
}

impl MetadataSource for SchemaSnapshot {
    fn load_table(&self, name: &ObjectName) -> TabulaResult<Option<TableDef>> {
        Ok(self.find_table(name).cloned())
    }

    fn load_routine(&self, name: &ObjectName, kind: RoutineKind) -> TabulaResult<Option<RoutineDef>> {
        Ok(self
            .find(
                self.routines.iter().filter(|r| r.kind == kind),
                name,
                RoutineDef::object_name,
            )
            .cloned())
    }

    fn load_user_defined_type(&self, name: &ObjectName) -> TabulaResult<Option<UserDefinedTypeDef>> {
        Ok(self
            .find(self.types.iter(), name, UserDefinedTypeDef::object_name)
            .cloned())
    }

    fn load_indexes(&self, table: &ObjectName) -> TabulaResult<Vec<IndexDef>> {
        Ok(self
            .find_table(table)
            .map(|t| t.indexes.clone())
            .unwrap_or_default())
    }

    fn load_foreign_keys(&self, table: &ObjectName) -> TabulaResult<Vec<ForeignKeyDef>> {
        Ok(self
            .find_table(table)
            .map(|t| t.foreign_keys.clone())
            .unwrap_or_default())
    }

    fn list_tables(&self) -> TabulaResult<Vec<ObjectName>> {
        Ok(self.tables.iter().map(TableDef::object_name).collect())
    }

    fn list_routines(&self, kind: RoutineKind) -> TabulaResult<Vec<ObjectName>> {
        Ok(self
            .routines
            .iter()
            .filter(|r| r.kind == kind)
            .map(RoutineDef::object_name)
            .collect())
    }

    fn list_user_defined_types(&self) -> TabulaResult<Vec<ObjectName>> {
        Ok(self.types.iter().map(UserDefinedTypeDef::object_name).collect())
    }
}

fn split_name(name: &str) -> (Option<String>, String) {
    match ObjectName::parse(name) {
        Ok(n) => (n.schema().map(str::to_string), n.name().to_string()),
        Err(_) => (None, name.to_string()),
    }
}
