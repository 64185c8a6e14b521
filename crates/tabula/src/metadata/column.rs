use super::snapshot::ColumnDef;
use crate::dialect::Dialect;
use crate::ident::normalize_name;
use crate::value::ValueKind;

/// A column of a table, view, table function or table type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    /// Name as stored in the database.
    pub name: String,
    /// Name quoted for the dialect.
    pub quoted_name: String,
    /// Lowercase alphanumerics only, for loose matching.
    pub normalized_name: String,
    /// Parameter name used when this column is bound, without dialect prefix.
    pub variable_name: String,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub is_identity: bool,
    pub is_computed: bool,
    pub native_type: String,
    /// `None` when the native type has no known mapping.
    pub kind: Option<ValueKind>,
    pub max_length: Option<i32>,
    pub precision: Option<i32>,
    pub scale: Option<i32>,
    pub is_unsigned: bool,
}

impl ColumnMetadata {
    pub(crate) fn from_def(def: &ColumnDef, dialect: &dyn Dialect, kind: Option<ValueKind>) -> Self {
        Self {
            name: def.name.clone(),
            quoted_name: dialect.quote_identifier(&def.name),
            normalized_name: normalize_name(&def.name),
            variable_name: variable_name(&def.name),
            is_nullable: def.is_nullable,
            is_primary_key: def.is_primary_key,
            is_identity: def.is_identity,
            is_computed: def.is_computed,
            native_type: def.native_type.clone(),
            kind,
            max_length: def.max_length,
            precision: def.precision,
            scale: def.scale,
            is_unsigned: def.is_unsigned,
        }
    }

    /// Must be supplied on insert: non-nullable and not generated by the database.
    pub fn is_required(&self) -> bool {
        !self.is_nullable && !self.is_identity && !self.is_computed
    }

    /// Whether `name` refers to this column (exact name ignoring case, or normalized form).
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.normalized_name == normalize_name(name)
    }
}

/// Turn a database name into a safe parameter name: `Order Date` becomes `Order_Date`.
pub(crate) fn variable_name(name: &str) -> String {
    let mut out: String = name
        .trim_start_matches(['@', ':', '$'])
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, 'p');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_names_are_sanitized() {
        assert_eq!(variable_name("Order Date"), "Order_Date");
        assert_eq!(variable_name("@CustomerKey"), "CustomerKey");
        assert_eq!(variable_name("2fa"), "p2fa");
    }
}
