//! Database object names.
//!
//! [`ObjectName`] is an optionally schema-qualified name such as `sales.Customer`.
//! Parsing accepts every quoting style the supported dialects use:
//!
//! - `"Name"` (PostgreSQL, SQLite), with `""` as an escaped quote
//! - `[Name]` (SQL Server), with `]]` as an escaped bracket
//! - `` `Name` `` (MySQL), with ``` `` ``` as an escaped backtick
//!
//! Unquoted parts are validated against `[A-Za-z_][A-Za-z0-9_$#@]*`.
//!
//! # Example
//! ```ignore
//! use tabula::ObjectName;
//!
//! let n = ObjectName::parse("[sales].[Customer]")?;
//! assert_eq!(n.schema(), Some("sales"));
//! assert_eq!(n.name(), "Customer");
//! # Ok::<(), tabula::TabulaError>(())
//! ```

use crate::error::{TabulaResult, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An optionally schema-qualified object name, stored unquoted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectName {
    schema: Option<String>,
    name: String,
}

impl ObjectName {
    /// Create a name from already-unquoted parts.
    pub fn new(schema: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.map(str::to_string),
            name: name.into(),
        }
    }

    /// Parse a possibly quoted, possibly schema-qualified name.
    pub fn parse(s: &str) -> TabulaResult<Self> {
        let invalid = |message: String| ValidationError::InvalidIdentifier {
            name: s.to_string(),
            message,
        };

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(invalid("identifier cannot be empty".into()).into());
        }
        if trimmed.contains('\0') {
            return Err(invalid("identifier cannot contain NUL".into()).into());
        }

        let mut parts = Vec::new();
        let mut chars = trimmed.chars().peekable();

        while chars.peek().is_some() {
            if !parts.is_empty() {
                match chars.next() {
                    Some('.') if chars.peek().is_some() => {}
                    Some('.') => return Err(invalid("trailing '.'".into()).into()),
                    Some(c) => {
                        return Err(invalid(format!("expected '.' between parts, got '{c}'")).into());
                    }
                    None => break,
                }
            }

            let close = match chars.peek() {
                Some('"') => Some('"'),
                Some('[') => Some(']'),
                Some('`') => Some('`'),
                _ => None,
            };

            if let Some(close) = close {
                chars.next();
                let mut part = String::new();
                loop {
                    match chars.next() {
                        Some(c) if c == close => {
                            if chars.peek() == Some(&close) {
                                chars.next();
                                part.push(close);
                            } else {
                                break;
                            }
                        }
                        Some(c) => part.push(c),
                        None => return Err(invalid("unclosed quoted identifier".into()).into()),
                    }
                }
                if part.is_empty() {
                    return Err(invalid("empty quoted identifier".into()).into());
                }
                parts.push(part);
                continue;
            }

            let mut part = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                let ok = if part.is_empty() {
                    c == '_' || c.is_ascii_alphabetic()
                } else {
                    c == '_' || c == '$' || c == '#' || c == '@' || c.is_ascii_alphanumeric()
                };
                if !ok {
                    return Err(invalid(format!("invalid character '{c}'")).into());
                }
                part.push(c);
                chars.next();
            }
            if part.is_empty() {
                return Err(invalid("empty identifier segment".into()).into());
            }
            parts.push(part);
        }

        match parts.len() {
            1 => Ok(Self {
                schema: None,
                name: parts.remove(0),
            }),
            2 => {
                let name = parts.remove(1);
                Ok(Self {
                    schema: Some(parts.remove(0)),
                    name,
                })
            }
            n => Err(invalid(format!("expected at most 2 parts, got {n}")).into()),
        }
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return this name qualified with `schema` when it has none.
    pub fn or_schema(&self, schema: Option<&str>) -> Self {
        match (&self.schema, schema) {
            (None, Some(s)) => Self::new(Some(s), self.name.clone()),
            _ => self.clone(),
        }
    }

    /// Case-insensitive cache key.
    pub fn key(&self) -> String {
        match &self.schema {
            Some(s) => format!("{}.{}", s.to_lowercase(), self.name.to_lowercase()),
            None => self.name.to_lowercase(),
        }
    }

    /// Case-insensitive comparison that treats a missing schema as a wildcard.
    pub fn matches(&self, other: &ObjectName) -> bool {
        if !self.name.eq_ignore_ascii_case(&other.name) {
            return false;
        }
        match (&self.schema, &other.schema) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => true,
        }
    }

    /// Write the name quoted with the given delimiters.
    pub(crate) fn write_quoted(&self, out: &mut String, open: char, close: char) {
        if let Some(schema) = &self.schema {
            write_quoted_part(out, schema, open, close);
            out.push('.');
        }
        write_quoted_part(out, &self.name, open, close);
    }
}

/// Quote a single identifier part, doubling the closing delimiter.
pub(crate) fn write_quoted_part(out: &mut String, part: &str, open: char, close: char) {
    out.push(open);
    for c in part.chars() {
        if c == close {
            out.push(close);
        }
        out.push(c);
    }
    out.push(close);
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(s) => write!(f, "{s}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Normalize a column or parameter name for matching: alphanumerics only, lowercase.
///
/// `Customer_Key`, `@CustomerKey` and `customerkey` all normalize to `customerkey`.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_qualified_names() {
        let n = ObjectName::parse("Customer").unwrap();
        assert_eq!(n.schema(), None);
        assert_eq!(n.name(), "Customer");

        let n = ObjectName::parse("sales.Customer").unwrap();
        assert_eq!(n.schema(), Some("sales"));
        assert_eq!(n.name(), "Customer");
    }

    #[test]
    fn parses_every_quoting_style() {
        for s in [r#""sales"."Order Detail""#, "[sales].[Order Detail]", "`sales`.`Order Detail`"] {
            let n = ObjectName::parse(s).unwrap();
            assert_eq!(n.schema(), Some("sales"), "{s}");
            assert_eq!(n.name(), "Order Detail", "{s}");
        }
    }

    #[test]
    fn escaped_delimiters_are_unescaped() {
        let n = ObjectName::parse(r#""a""b""#).unwrap();
        assert_eq!(n.name(), r#"a"b"#);
        let n = ObjectName::parse("[a]]b]").unwrap();
        assert_eq!(n.name(), "a]b");
    }

    #[test]
    fn rejects_bad_names() {
        assert!(ObjectName::parse("").is_err());
        assert!(ObjectName::parse("a.b.c").is_err());
        assert!(ObjectName::parse("a;drop").is_err());
        assert!(ObjectName::parse("\"open").is_err());
        assert!(ObjectName::parse("a.").is_err());
    }

    #[test]
    fn matching_is_case_insensitive_and_schema_optional() {
        let a = ObjectName::parse("dbo.Customer").unwrap();
        let b = ObjectName::parse("CUSTOMER").unwrap();
        assert!(a.matches(&b));
        assert!(!a.matches(&ObjectName::parse("sales.customer").unwrap()));
    }

    #[test]
    fn quoting_doubles_the_closing_delimiter() {
        let mut out = String::new();
        ObjectName::new(Some("dbo"), "we]ird").write_quoted(&mut out, '[', ']');
        assert_eq!(out, "[dbo].[we]]ird]");
    }

    #[test]
    fn normalize_strips_punctuation() {
        assert_eq!(normalize_name("@Customer_Key"), "customerkey");
        assert_eq!(normalize_name("p_customer_key"), "pcustomerkey");
    }
}
