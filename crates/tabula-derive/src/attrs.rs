//! Parsing of struct-level and field-level `#[tabula(...)]` attributes.

use heck::{ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use syn::{Attribute, Error, LitStr, Result};

#[derive(Clone, Copy)]
pub(crate) enum RenameRule {
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
}

impl RenameRule {
    fn parse(lit: &LitStr) -> Result<Self> {
        match lit.value().as_str() {
            "PascalCase" => Ok(Self::Pascal),
            "camelCase" => Ok(Self::Camel),
            "snake_case" => Ok(Self::Snake),
            "SCREAMING_SNAKE_CASE" => Ok(Self::ScreamingSnake),
            other => Err(Error::new(
                lit.span(),
                format!("unknown rename_all rule '{other}'"),
            )),
        }
    }

    pub(crate) fn apply(self, field: &str) -> String {
        match self {
            Self::Pascal => field.to_upper_camel_case(),
            Self::Camel => field.to_lower_camel_case(),
            Self::Snake => field.to_snake_case(),
            Self::ScreamingSnake => field.to_shouty_snake_case(),
        }
    }
}

#[derive(Default)]
pub(crate) struct StructAttrs {
    pub table: Option<String>,
    pub rename_all: Option<RenameRule>,
}

#[derive(Default)]
pub(crate) struct FieldAttrs {
    pub column: Option<String>,
    pub key: bool,
    pub ignore_on_insert: bool,
    pub ignore_on_update: bool,
    pub skip: bool,
}

fn non_empty(lit: LitStr, what: &str) -> Result<String> {
    let value = lit.value();
    if value.trim().is_empty() {
        return Err(Error::new(lit.span(), format!("{what} must not be empty")));
    }
    Ok(value)
}

pub(crate) fn parse_struct_attrs(attrs: &[Attribute]) -> Result<StructAttrs> {
    let mut out = StructAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("tabula")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                out.table = Some(non_empty(meta.value()?.parse()?, "table")?);
            } else if meta.path.is_ident("rename_all") {
                out.rename_all = Some(RenameRule::parse(&meta.value()?.parse()?)?);
            } else {
                return Err(meta.error("unknown struct attribute; expected `table` or `rename_all`"));
            }
            Ok(())
        })?;
    }
    Ok(out)
}

pub(crate) fn parse_field_attrs(attrs: &[Attribute]) -> Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("tabula")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("column") {
                out.column = Some(non_empty(meta.value()?.parse()?, "column")?);
            } else if meta.path.is_ident("key") {
                out.key = true;
            } else if meta.path.is_ident("ignore_on_insert") {
                out.ignore_on_insert = true;
            } else if meta.path.is_ident("ignore_on_update") {
                out.ignore_on_update = true;
            } else if meta.path.is_ident("skip") {
                out.skip = true;
            } else {
                return Err(meta.error(
                    "unknown field attribute; expected `column`, `key`, `ignore_on_insert`, `ignore_on_update` or `skip`",
                ));
            }
            Ok(())
        })?;
    }
    Ok(out)
}
