//! Class-to-table mapping descriptors and argument records.
//!
//! A [`Record`] is the data an operation works on: an ordered list of named
//! values, each optionally carrying a declared column name and per-operation
//! flags. A [`ClassMapping`] describes a Rust type's table and fields. Both
//! are produced by `#[derive(Mapped)]`, or can be written by hand.
//!
//! ```ignore
//! use tabula::Mapped;
//!
//! #[derive(Mapped)]
//! #[tabula(table = "Customer")]
//! struct Customer {
//!     #[tabula(key, ignore_on_insert)]
//!     id: Option<i32>,
//!     name: String,
//!     #[tabula(column = "EmailAddress")]
//!     email: String,
//! }
//! ```

use crate::value::Value;

/// One named value in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordField {
    pub name: String,
    /// Declared column name, when it differs from `name`.
    pub column: Option<String>,
    pub value: Value,
    pub ignore_on_insert: bool,
    pub ignore_on_update: bool,
    /// Marked as a key by the mapping (used with `use_key_attribute`).
    pub is_key: bool,
}

impl RecordField {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            column: None,
            value: value.into(),
            ignore_on_insert: false,
            ignore_on_update: false,
            is_key: false,
        }
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn key(mut self) -> Self {
        self.is_key = true;
        self
    }

    pub fn ignore_on_insert(mut self) -> Self {
        self.ignore_on_insert = true;
        self
    }

    pub fn ignore_on_update(mut self) -> Self {
        self.ignore_on_update = true;
        self
    }

    /// The name used to match this field against columns and parameters.
    pub fn column_name(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }
}

/// An ordered set of named values used as an operation argument or filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<RecordField>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plain field.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push(RecordField::new(name, value));
        self
    }

    /// Append a fully described field.
    pub fn with_field(mut self, field: RecordField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn push(&mut self, field: RecordField) {
        self.fields.push(field);
    }

    pub fn fields(&self) -> &[RecordField] {
        &self.fields
    }

    /// Find a field by name or declared column (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&RecordField> {
        self.fields.iter().find(|f| {
            f.name.eq_ignore_ascii_case(name)
                || f.column.as_deref().is_some_and(|c| c.eq_ignore_ascii_case(name))
        })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<N: Into<String>, V: Into<Value>> FromIterator<(N, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(n, v)| RecordField::new(n, v))
                .collect(),
        }
    }
}

/// The argument of a command: a record, or a bare value bound to the single
/// key column (tables) or the single parameter (routines).
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Record(Record),
    Scalar(Value),
}

impl From<Record> for Argument {
    fn from(r: Record) -> Self {
        Argument::Record(r)
    }
}

impl From<&Record> for Argument {
    fn from(r: &Record) -> Self {
        Argument::Record(r.clone())
    }
}

impl From<Value> for Argument {
    fn from(v: Value) -> Self {
        Argument::Scalar(v)
    }
}

macro_rules! impl_scalar_argument {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Argument {
                fn from(v: $ty) -> Self {
                    Argument::Scalar(Value::from(v))
                }
            }
        )+
    };
}

impl_scalar_argument! {
    bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64,
    rust_decimal::Decimal, String, &str, &String, char, uuid::Uuid,
    chrono::NaiveDate, chrono::NaiveTime, chrono::NaiveDateTime, chrono::DateTime<chrono::Utc>,
}

/// Mapping of one Rust field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub field: String,
    pub column: Option<String>,
    pub is_key: bool,
    pub ignore_on_insert: bool,
    pub ignore_on_update: bool,
}

/// Mapping of a Rust type onto a table or view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMapping {
    /// Rust type name (used for convention-based table lookup).
    pub type_name: String,
    /// Explicit table name, possibly schema-qualified.
    pub table: Option<String>,
    pub fields: Vec<FieldMapping>,
}

impl ClassMapping {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            table: None,
            fields: Vec::new(),
        }
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn field(mut self, field: FieldMapping) -> Self {
        self.fields.push(field);
        self
    }

    pub fn key_fields(&self) -> impl Iterator<Item = &FieldMapping> {
        self.fields.iter().filter(|f| f.is_key)
    }
}

/// A type with a table mapping.
///
/// Usually implemented by `#[derive(Mapped)]`.
pub trait Mapped {
    fn mapping() -> ClassMapping;

    fn to_record(&self) -> Record;
}

/// Startup registration of a mapped type, submitted by `#[derive(Mapped)]`.
///
/// [`SchemaCache::validate_registered_mappings`](crate::SchemaCache::validate_registered_mappings)
/// resolves every registered mapping against the cache.
pub struct MappingRegistration {
    pub type_name: &'static str,
    pub mapping: fn() -> ClassMapping,
}

inventory::collect!(MappingRegistration);

/// Iterate over all registered mappings.
pub fn registered_mappings() -> impl Iterator<Item = &'static MappingRegistration> {
    inventory::iter::<MappingRegistration>.into_iter()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_convert_into_arguments() {
        assert_eq!(Argument::from(5), Argument::Scalar(Value::Int(5)));
        assert_eq!(Argument::from("a"), Argument::Scalar(Value::from("a")));
        assert!(matches!(Argument::from(Record::new()), Argument::Record(_)));
    }

    #[test]
    fn get_matches_name_or_declared_column() {
        let r = Record::new()
            .with("id", 5)
            .with_field(RecordField::new("email", "a@b.com").column("EmailAddress"));
        assert_eq!(r.get("ID").map(|f| &f.value), Some(&Value::Int(5)));
        assert!(r.get("emailaddress").is_some());
        assert!(r.get("email").is_some());
        assert!(r.get("name").is_none());
    }

    #[test]
    fn collects_from_pairs_in_order() {
        let r: Record = [("Id", Value::Int(5)), ("Name", Value::from("x"))]
            .into_iter()
            .collect();
        let names: Vec<_> = r.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Id", "Name"]);
    }
}
