use super::snapshot::IndexDef;

/// A column participating in an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumnMetadata {
    pub name: String,
    pub is_descending: bool,
    /// Stored in the index leaf but not part of the key.
    pub is_included: bool,
}

/// An index on a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMetadata {
    pub name: String,
    pub is_primary_key: bool,
    pub is_unique: bool,
    pub is_unique_constraint: bool,
    pub columns: Vec<IndexColumnMetadata>,
    /// Approximate size in KB, when the catalog reports it.
    pub size_kb: Option<i64>,
    pub row_count: Option<i64>,
}

impl IndexMetadata {
    /// Key columns in index order, excluding included columns.
    pub fn key_columns(&self) -> impl Iterator<Item = &IndexColumnMetadata> {
        self.columns.iter().filter(|c| !c.is_included)
    }
}

impl From<&IndexDef> for IndexMetadata {
    fn from(def: &IndexDef) -> Self {
        Self {
            name: def.name.clone(),
            is_primary_key: def.is_primary_key,
            is_unique: def.is_unique || def.is_primary_key,
            is_unique_constraint: def.is_unique_constraint,
            columns: def
                .columns
                .iter()
                .map(|c| IndexColumnMetadata {
                    name: c.name.clone(),
                    is_descending: c.is_descending,
                    is_included: c.is_included,
                })
                .collect(),
            size_kb: def.size_kb,
            row_count: def.row_count,
        }
    }
}
