//! Dynamically typed parameter values and the kinds they coerce to.
//!
//! [`Value`] is what argument records carry and what statements bind.
//! [`ValueKind`] is the resolved, driver-independent type of a column or
//! routine parameter. When the two disagree the SQL builder calls
//! [`Value::coerce_to`] before binding.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Decimal(Decimal),
    String(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
    Json(serde_json::Value),
    /// An enum member: its name and numeric discriminant.
    Enum { name: String, discriminant: i64 },
}

/// Driver-independent type of a column or parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Decimal,
    String,
    Char,
    Bytes,
    Date,
    Time,
    DateTime,
    Timestamp,
    Uuid,
    Json,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::I8 => "i8",
            ValueKind::I16 => "i16",
            ValueKind::I32 => "i32",
            ValueKind::I64 => "i64",
            ValueKind::U8 => "u8",
            ValueKind::U16 => "u16",
            ValueKind::U32 => "u32",
            ValueKind::U64 => "u64",
            ValueKind::F32 => "f32",
            ValueKind::F64 => "f64",
            ValueKind::Decimal => "decimal",
            ValueKind::String => "string",
            ValueKind::Char => "char",
            ValueKind::Bytes => "bytes",
            ValueKind::Date => "date",
            ValueKind::Time => "time",
            ValueKind::DateTime => "datetime",
            ValueKind::Timestamp => "timestamp",
            ValueKind::Uuid => "uuid",
            ValueKind::Json => "json",
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ValueKind::I8
                | ValueKind::I16
                | ValueKind::I32
                | ValueKind::I64
                | ValueKind::U8
                | ValueKind::U16
                | ValueKind::U32
                | ValueKind::U64
        )
    }

    pub fn is_textual(self) -> bool {
        matches!(self, ValueKind::String | ValueKind::Char)
    }

    fn integer_range(self) -> (i128, i128) {
        match self {
            ValueKind::I8 => (i8::MIN as i128, i8::MAX as i128),
            ValueKind::I16 => (i16::MIN as i128, i16::MAX as i128),
            ValueKind::I32 => (i32::MIN as i128, i32::MAX as i128),
            ValueKind::U8 => (0, u8::MAX as i128),
            ValueKind::U16 => (0, u16::MAX as i128),
            ValueKind::U32 => (0, u32::MAX as i128),
            ValueKind::U64 => (0, u64::MAX as i128),
            _ => (i64::MIN as i128, i64::MAX as i128),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the runtime type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::DateTime(_) => "datetime",
            Value::Timestamp(_) => "timestamp",
            Value::Uuid(_) => "uuid",
            Value::Json(_) => "json",
            Value::Enum { .. } => "enum",
        }
    }

    /// Whether this value can be bound to a column of `kind` without conversion.
    pub fn matches_kind(&self, kind: ValueKind) -> bool {
        match (self, kind) {
            (Value::Null, _) => true,
            (Value::Bool(_), ValueKind::Bool) => true,
            (Value::Int(v), k) if k.is_integer() => {
                let (min, max) = k.integer_range();
                (min..=max).contains(&(*v as i128))
            }
            (Value::UInt(v), k) if k.is_integer() => {
                let (min, max) = k.integer_range();
                (min..=max).contains(&(*v as i128))
            }
            (Value::Float(_), ValueKind::F32 | ValueKind::F64) => true,
            (Value::Decimal(_), ValueKind::Decimal) => true,
            (Value::String(_), ValueKind::String) => true,
            (Value::String(s), ValueKind::Char) => s.chars().count() == 1,
            (Value::Bytes(_), ValueKind::Bytes) => true,
            (Value::Date(_), ValueKind::Date) => true,
            (Value::Time(_), ValueKind::Time) => true,
            (Value::DateTime(_), ValueKind::DateTime) => true,
            (Value::Timestamp(_), ValueKind::Timestamp) => true,
            (Value::Uuid(_), ValueKind::Uuid) => true,
            (Value::Json(_), ValueKind::Json) => true,
            _ => false,
        }
    }

    /// Convert this value into one acceptable for `kind`.
    ///
    /// Strings parse into numbers, booleans, temporal values and UUIDs;
    /// numbers convert between widths with range checks; enums become their
    /// discriminant (numeric targets) or their name (text targets).
    pub fn coerce_to(&self, kind: ValueKind) -> Result<Value, String> {
        if self.matches_kind(kind) {
            return Ok(self.clone());
        }

        match (self, kind) {
            (Value::Enum { discriminant, .. }, k) if k.is_integer() => {
                Value::Int(*discriminant).coerce_to(k)
            }
            (Value::Enum { name, .. }, k) if k.is_textual() => Ok(Value::String(name.clone())),
            (Value::Int(v), k) if k.is_integer() => Err(format!("{v} is out of range for {k}")),
            (Value::UInt(v), k) if k.is_integer() => Err(format!("{v} is out of range for {k}")),
            (Value::Int(v), ValueKind::F32 | ValueKind::F64) => Ok(Value::Float(*v as f64)),
            (Value::UInt(v), ValueKind::F32 | ValueKind::F64) => Ok(Value::Float(*v as f64)),
            (Value::Int(v), ValueKind::Decimal) => Ok(Value::Decimal(Decimal::from(*v))),
            (Value::UInt(v), ValueKind::Decimal) => Ok(Value::Decimal(Decimal::from(*v))),
            (Value::Int(v), ValueKind::Bool) => match v {
                0 => Ok(Value::Bool(false)),
                1 => Ok(Value::Bool(true)),
                _ => Err(format!("{v} is not 0 or 1")),
            },
            (Value::Float(v), ValueKind::Decimal) => Decimal::from_f64(*v)
                .map(Value::Decimal)
                .ok_or_else(|| format!("{v} cannot be represented as a decimal")),
            (Value::Float(v), k) if k.is_integer() => {
                if v.fract() != 0.0 {
                    return Err(format!("{v} has a fractional part"));
                }
                // `as` saturates; 2^63 itself is already out of range.
                if *v < i64::MIN as f64 || *v >= i64::MAX as f64 {
                    return Err(format!("{v} is out of range for {k}"));
                }
                Value::Int(*v as i64).coerce_to(k)
            }
            (Value::Decimal(d), ValueKind::F32 | ValueKind::F64) => d
                .to_f64()
                .map(Value::Float)
                .ok_or_else(|| format!("{d} cannot be represented as a float")),
            (Value::Decimal(d), k) if k.is_integer() => {
                if !d.fract().is_zero() {
                    return Err(format!("{d} has a fractional part"));
                }
                d.to_i64()
                    .map(Value::Int)
                    .ok_or_else(|| format!("{d} is out of range for {k}"))
                    .and_then(|v| v.coerce_to(k))
            }
            (Value::Bool(b), k) if k.is_integer() => Ok(Value::Int(i64::from(*b))),
            (Value::DateTime(dt), ValueKind::Date) => Ok(Value::Date(dt.date())),
            (Value::DateTime(dt), ValueKind::Timestamp) => Ok(Value::Timestamp(dt.and_utc())),
            (Value::Timestamp(ts), ValueKind::DateTime) => Ok(Value::DateTime(ts.naive_utc())),
            (Value::Date(d), ValueKind::DateTime) => Ok(Value::DateTime(d.and_time(NaiveTime::MIN))),
            (Value::Uuid(u), k) if k.is_textual() => Ok(Value::String(u.to_string())),
            (Value::String(s), k) => coerce_string(s, k),
            (v, k) if k.is_textual() => match v {
                Value::Int(i) => Ok(Value::String(i.to_string())),
                Value::UInt(i) => Ok(Value::String(i.to_string())),
                Value::Float(f) => Ok(Value::String(f.to_string())),
                Value::Decimal(d) => Ok(Value::String(d.to_string())),
                _ => Err(format!("{} cannot be converted to {k}", v.type_name())),
            },
            (v, ValueKind::Json) => Ok(Value::Json(v.to_json())),
            (v, k) => Err(format!("{} cannot be converted to {k}", v.type_name())),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Value::Null => J::Null,
            Value::Bool(b) => J::Bool(*b),
            Value::Int(i) => J::from(*i),
            Value::UInt(u) => J::from(*u),
            Value::Float(f) => J::from(*f),
            Value::Decimal(d) => J::String(d.to_string()),
            Value::String(s) => J::String(s.clone()),
            Value::Bytes(b) => J::Array(b.iter().map(|x| J::from(*x)).collect()),
            Value::Date(d) => J::String(d.to_string()),
            Value::Time(t) => J::String(t.to_string()),
            Value::DateTime(dt) => J::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            Value::Timestamp(ts) => J::String(ts.to_rfc3339()),
            Value::Uuid(u) => J::String(u.to_string()),
            Value::Json(j) => j.clone(),
            Value::Enum { name, .. } => J::String(name.clone()),
        }
    }
}

fn coerce_string(s: &str, kind: ValueKind) -> Result<Value, String> {
    let trimmed = s.trim();
    let parsed = match kind {
        ValueKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" | "y" => Some(Value::Bool(true)),
            "false" | "f" | "0" | "no" | "n" => Some(Value::Bool(false)),
            _ => None,
        },
        k if k.is_integer() => {
            return match trimmed.parse::<i64>() {
                Ok(v) => Value::Int(v).coerce_to(k),
                Err(_) => trimmed
                    .parse::<u64>()
                    .map_err(|e| format!("'{s}' is not an integer: {e}"))
                    .and_then(|v| Value::UInt(v).coerce_to(k)),
            };
        }
        ValueKind::F32 | ValueKind::F64 => trimmed.parse::<f64>().ok().map(Value::Float),
        ValueKind::Decimal => Decimal::from_str(trimmed).ok().map(Value::Decimal),
        ValueKind::Char if s.chars().count() == 1 => Some(Value::String(s.to_string())),
        ValueKind::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .or_else(|| parse_naive_datetime(trimmed).map(|dt| dt.date()))
            .map(Value::Date),
        ValueKind::Time => NaiveTime::parse_from_str(trimmed, "%H:%M:%S%.f")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
            .ok()
            .map(Value::Time),
        ValueKind::DateTime => parse_naive_datetime(trimmed)
            .or_else(|| {
                NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                    .ok()
                    .map(|d| d.and_time(NaiveTime::MIN))
            })
            .map(Value::DateTime),
        ValueKind::Timestamp => DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| parse_naive_datetime(trimmed).map(|dt| dt.and_utc()))
            .map(Value::Timestamp),
        ValueKind::Uuid => Uuid::parse_str(trimmed).ok().map(Value::Uuid),
        ValueKind::Json => serde_json::from_str(s).ok().map(Value::Json),
        ValueKind::Bytes => Some(Value::Bytes(s.as_bytes().to_vec())),
        _ => None,
    };
    parsed.ok_or_else(|| format!("'{s}' is not a valid {kind}"))
}

fn parse_naive_datetime(s: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::UInt(u) => write!(f, "{u}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Date(d) => write!(f, "{d}"),
            Value::Time(t) => write!(f, "{t}"),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Value::Uuid(u) => write!(f, "{u}"),
            Value::Json(j) => write!(f, "{j}"),
            Value::Enum { name, .. } => f.write_str(name),
        }
    }
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident $(as $cast:ty)?),+ $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v $(as $cast)?)
                }
            }
        )+
    };
}

impl_from_value! {
    bool => Bool,
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int,
    u8 => UInt as u64,
    u16 => UInt as u64,
    u32 => UInt as u64,
    u64 => UInt,
    f32 => Float as f64,
    f64 => Float,
    Decimal => Decimal,
    String => String,
    Vec<u8> => Bytes,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => DateTime,
    DateTime<Utc> => Timestamp,
    Uuid => Uuid,
    serde_json::Value => Json,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::String(v.clone())
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_string_coerces_to_datetime() {
        let v = Value::from("2024-03-01T10:20:30").coerce_to(ValueKind::DateTime).unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 20, 30)
            .unwrap();
        assert_eq!(v, Value::DateTime(expected));
    }

    #[test]
    fn string_coerces_to_integer_with_range_check() {
        assert_eq!(Value::from("42").coerce_to(ValueKind::I16).unwrap(), Value::Int(42));
        assert!(Value::from("70000").coerce_to(ValueKind::I16).is_err());
        assert!(Value::from("abc").coerce_to(ValueKind::I32).is_err());
    }

    #[test]
    fn int_out_of_range_is_rejected() {
        assert!(Value::Int(-1).coerce_to(ValueKind::U8).is_err());
        assert_eq!(Value::Int(255).coerce_to(ValueKind::U8).unwrap(), Value::Int(255));
    }

    #[test]
    fn enum_coerces_to_discriminant_or_name() {
        let e = Value::Enum {
            name: "Active".into(),
            discriminant: 2,
        };
        assert_eq!(e.coerce_to(ValueKind::I32).unwrap(), Value::Int(2));
        assert_eq!(e.coerce_to(ValueKind::String).unwrap(), Value::from("Active"));
    }

    #[test]
    fn null_matches_every_kind() {
        assert_eq!(Value::Null.coerce_to(ValueKind::Uuid).unwrap(), Value::Null);
    }

    #[test]
    fn option_converts_to_null() {
        let none: Option<i32> = None;
        assert_eq!(Value::from(none), Value::Null);
        assert_eq!(Value::from(Some(3_i32)), Value::Int(3));
    }

    #[test]
    fn fractional_float_does_not_become_integer() {
        assert!(Value::Float(1.5).coerce_to(ValueKind::I64).is_err());
        assert_eq!(Value::Float(2.0).coerce_to(ValueKind::I64).unwrap(), Value::Int(2));
    }

    #[test]
    fn oversized_float_does_not_saturate() {
        assert!(Value::Float(1e20).coerce_to(ValueKind::I64).is_err());
        assert!(Value::Float(-1e20).coerce_to(ValueKind::I64).is_err());
        assert!(Value::Float(f64::INFINITY).coerce_to(ValueKind::I64).is_err());
        assert!(Value::Float(70000.0).coerce_to(ValueKind::I16).is_err());
        assert_eq!(
            Value::Float(-9.0e15).coerce_to(ValueKind::I64).unwrap(),
            Value::Int(-9_000_000_000_000_000)
        );
    }
}
