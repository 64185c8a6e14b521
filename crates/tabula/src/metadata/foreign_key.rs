use super::snapshot::ForeignKeyDef;
use crate::error::{SchemaError, TabulaResult};
use crate::ident::ObjectName;

/// A foreign key from a child table to a parent table.
///
/// Both column lists are non-empty and pair up by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyConstraint {
    name: String,
    parent_table: ObjectName,
    parent_columns: Vec<String>,
    child_table: ObjectName,
    child_columns: Vec<String>,
}

impl ForeignKeyConstraint {
    pub fn new(
        name: impl Into<String>,
        parent_table: ObjectName,
        parent_columns: Vec<String>,
        child_table: ObjectName,
        child_columns: Vec<String>,
    ) -> TabulaResult<Self> {
        let name = name.into();
        let invalid = |message: String| SchemaError::InvalidMetadata {
            object: name.clone(),
            message,
        };

        if parent_columns.is_empty() {
            return Err(invalid("foreign key has no parent columns".into()).into());
        }
        if child_columns.is_empty() {
            return Err(invalid("foreign key has no child columns".into()).into());
        }
        if parent_columns.len() != child_columns.len() {
            return Err(invalid(format!(
                "{} parent columns do not pair with {} child columns",
                parent_columns.len(),
                child_columns.len()
            ))
            .into());
        }

        Ok(Self {
            name,
            parent_table,
            parent_columns,
            child_table,
            child_columns,
        })
    }

    pub(crate) fn from_def(def: &ForeignKeyDef, child_table: &ObjectName) -> TabulaResult<Self> {
        let parent_table = ObjectName::parse(&def.parent_table)?;
        Self::new(
            def.name.clone(),
            parent_table,
            def.parent_columns.clone(),
            child_table.clone(),
            def.child_columns.clone(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_table(&self) -> &ObjectName {
        &self.parent_table
    }

    pub fn parent_columns(&self) -> &[String] {
        &self.parent_columns
    }

    pub fn child_table(&self) -> &ObjectName {
        &self.child_table
    }

    pub fn child_columns(&self) -> &[String] {
        &self.child_columns
    }

    /// `(child, parent)` column pairs.
    pub fn column_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.child_columns
            .iter()
            .zip(&self.parent_columns)
            .map(|(c, p)| (c.as_str(), p.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> ObjectName {
        ObjectName::parse(s).unwrap()
    }

    #[test]
    fn rejects_mismatched_cardinality() {
        let err = ForeignKeyConstraint::new(
            "fk_order_customer",
            name("Customer"),
            vec!["Id".into()],
            name("Order"),
            vec!["CustomerId".into(), "Region".into()],
        )
        .unwrap_err();
        assert!(err.to_string().contains("fk_order_customer"));
    }

    #[test]
    fn rejects_empty_sides() {
        assert!(
            ForeignKeyConstraint::new("fk", name("A"), vec![], name("B"), vec![]).is_err()
        );
    }

    #[test]
    fn pairs_columns_by_position() {
        let fk = ForeignKeyConstraint::new(
            "fk",
            name("Region"),
            vec!["Country".into(), "Code".into()],
            name("Store"),
            vec!["RegionCountry".into(), "RegionCode".into()],
        )
        .unwrap();
        let pairs: Vec<_> = fk.column_pairs().collect();
        assert_eq!(pairs, [("RegionCountry", "Country"), ("RegionCode", "Code")]);
    }
}
