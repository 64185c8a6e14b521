use super::object::resolve_single_key;
use super::RowCountCheck;
use crate::builder::SqlBuilder;
use crate::data_source::DataSource;
use crate::error::{TabulaResult, ValidationError};
use crate::metadata::{ColumnMetadata, TableOrViewMetadata};
use crate::sql::Sql;
use crate::value::Value;
use std::sync::Arc;

/// Rows addressed by one key value or a key list.
///
/// The key column is the table's single primary key (or a view's base
/// table key) unless [`column`](Self::column) names a unique column.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyTarget {
    column: Option<String>,
    keys: Vec<Value>,
}

impl KeyTarget {
    pub fn single(key: impl Into<Value>) -> Self {
        Self {
            column: None,
            keys: vec![key.into()],
        }
    }

    pub fn list<I, V>(keys: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            column: None,
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Address rows through this column instead of the primary key.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn keys(&self) -> &[Value] {
        &self.keys
    }

    /// Distinct key values, in first-seen order.
    pub fn distinct_keys(&self) -> Vec<Value> {
        let mut out: Vec<Value> = Vec::with_capacity(self.keys.len());
        for key in &self.keys {
            if !out.contains(key) {
                out.push(key.clone());
            }
        }
        out
    }

    /// Rows a mutation through this target must affect.
    pub fn expected_rows(&self) -> RowCountCheck {
        RowCountCheck::Exactly(self.distinct_keys().len() as u64)
    }

    pub(crate) fn resolve(
        &self,
        source: &DataSource,
        table: &TableOrViewMetadata,
    ) -> TabulaResult<Arc<ColumnMetadata>> {
        resolve_single_key(source, table, self.column.as_deref())
    }

    /// `key = value` or `key IN (...)` over the distinct keys.
    pub(crate) fn build_filter(
        &self,
        builder: &mut SqlBuilder,
        column: &ColumnMetadata,
        operation: &str,
    ) -> TabulaResult<Sql> {
        let keys = self.distinct_keys();
        if keys.is_empty() {
            return Err(ValidationError::EmptyKeyList {
                operation: operation.to_string(),
                table: builder.object_name().to_string(),
            }
            .into());
        }
        builder.build_key_filter(column, &keys)
    }
}
