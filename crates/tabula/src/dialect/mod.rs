//! SQL dialects.
//!
//! The engine is written once against the [`Dialect`] trait. A dialect knows
//! how to quote names, write placeholders, map native types, render literals,
//! and arrange the statement shapes in [`statement`] into its own syntax.

mod mysql;
mod postgres;
mod sql_server;
mod sqlite;
pub mod statement;


pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sql_server::SqlServerDialect;
pub use sqlite::SqliteDialect;

use crate::command::{Limit, LimitOptions};
use crate::error::{SchemaError, TabulaResult};
use crate::ident::{ObjectName, write_quoted_part};
use crate::metadata::RoutineKind;
use crate::sql::{PlaceholderStyle, Sql};
use crate::value::{Value, ValueKind};
use statement::{
    DeleteStatement, InsertStatement, RoutineCall, SelectStatement, UpdateStatement,
    UpsertStatement,
};
use std::fmt;

pub trait Dialect: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Opening and closing identifier delimiters.
    fn quote_delimiters(&self) -> (char, char);

    fn quote_identifier(&self, name: &str) -> String {
        let (open, close) = self.quote_delimiters();
        let mut out = String::with_capacity(name.len() + 2);
        write_quoted_part(&mut out, name, open, close);
        out
    }

    fn quote_object_name(&self, name: &ObjectName) -> String {
        let (open, close) = self.quote_delimiters();
        let mut out = String::new();
        name.write_quoted(&mut out, open, close);
        out
    }

    fn parse_object_name(&self, s: &str) -> TabulaResult<ObjectName> {
        ObjectName::parse(s)
    }

    /// Schema assumed for unqualified names, if the engine has one.
    fn default_schema(&self) -> Option<&'static str>;

    fn placeholder_style(&self) -> PlaceholderStyle;

    /// Maximum bound parameters per statement. `None` means unlimited.
    fn max_parameters(&self) -> Option<usize>;

    /// Maximum rows in one multi-row `VALUES` list. `None` means unlimited.
    fn max_rows_per_statement(&self) -> Option<usize> {
        None
    }

    /// Built-in native type resolution. Unknown types return `None`.
    fn native_type_kind(
        &self,
        native_type: &str,
        max_length: Option<i32>,
        is_unsigned: bool,
    ) -> Option<ValueKind>;

    fn bool_literal(&self, value: bool) -> &'static str {
        if value { "TRUE" } else { "FALSE" }
    }

    fn bytes_literal(&self, bytes: &[u8]) -> String {
        format!("X'{}'", hex(bytes))
    }

    /// Render a value as an inline SQL literal.
    fn literal(&self, value: &Value) -> TabulaResult<String> {
        render_literal(self, value)
    }

    fn supports_routine(&self, kind: RoutineKind) -> bool;

    fn supports_limit(&self, options: LimitOptions) -> bool;

    /// Whether this limit can only be rendered with an `ORDER BY`.
    fn limit_requires_sort(&self, limit: &Limit) -> bool;

    fn render_insert(&self, stmt: InsertStatement) -> Sql;

    fn render_update(&self, stmt: UpdateStatement) -> Sql;

    fn render_delete(&self, stmt: DeleteStatement) -> Sql;

    fn render_upsert(&self, stmt: UpsertStatement) -> Sql;

    fn render_select(&self, stmt: SelectStatement) -> TabulaResult<Sql>;

    /// Render a procedure call, a scalar function select, or (for table
    /// functions) the invocation used as a `FROM` source.
    fn render_call(&self, call: RoutineCall) -> TabulaResult<Sql>;

    fn unsupported(&self, feature: &str) -> SchemaError {
        SchemaError::unsupported(feature, self.name())
    }
}

fn render_literal<D: Dialect + ?Sized>(dialect: &D, value: &Value) -> TabulaResult<String> {
    Ok(match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => dialect.bool_literal(*b).to_string(),
        Value::Int(i) => i.to_string(),
        Value::UInt(u) => u.to_string(),
        Value::Float(f) if f.is_finite() => f.to_string(),
        Value::Float(f) => return Err(dialect.unsupported(&format!("float literal {f}")).into()),
        Value::Decimal(d) => d.to_string(),
        Value::String(s) => quote_string(s),
        Value::Bytes(b) => dialect.bytes_literal(b),
        Value::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
        Value::Time(t) => format!("'{}'", t.format("%H:%M:%S%.f")),
        Value::DateTime(dt) => format!("'{}'", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
        Value::Timestamp(ts) => format!("'{}'", ts.to_rfc3339()),
        Value::Uuid(u) => format!("'{u}'"),
        Value::Json(j) => quote_string(&j.to_string()),
        Value::Enum { discriminant, .. } => discriminant.to_string(),
    })
}

/// Single-quote a string, doubling embedded quotes.
pub(crate) fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02X}");
    }
    out
}

/// Lowercase a native type and strip any `(length)` suffix.
pub(crate) fn base_type_name(native_type: &str) -> String {
    native_type
        .split('(')
        .next()
        .unwrap_or(native_type)
        .trim()
        .to_lowercase()
}

pub(crate) fn comma_list(items: &[String]) -> String {
    items.join(", ")
}

/// `a = EXCLUDED.a, b = EXCLUDED.b` style assignment lists.
pub(crate) fn assignments(columns: &[String], source: impl Fn(&str) -> String) -> String {
    columns
        .iter()
        .map(|c| format!("{c} = {}", source(c)))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn render_projection(projection: &statement::Projection) -> String {
    match projection {
        statement::Projection::Columns(cols) if !cols.is_empty() => comma_list(cols),
        statement::Projection::Columns(_) | statement::Projection::Constant => "1".to_string(),
        statement::Projection::Count => "COUNT(*)".to_string(),
    }
}

pub(crate) fn push_where(sql: &mut Sql, filter: Option<Sql>) {
    if let Some(filter) = filter.filter(|f| !f.is_empty()) {
        sql.push(" WHERE ");
        sql.push_sql(filter);
    }
}

pub(crate) fn push_order_by(sql: &mut Sql, order_by: &[String]) {
    if !order_by.is_empty() {
        sql.push(" ORDER BY ");
        sql.push(&comma_list(order_by));
    }
}

/// Comma-joined call arguments in declaration order; `missing` renders a
/// parameter the caller did not supply (`None` omits it).
pub(crate) fn positional_arguments(
    call: &mut RoutineCall,
    missing: Option<&str>,
) -> Sql {
    let mut parts = Vec::new();
    for arg in call.arguments.drain(..) {
        match (arg.value, missing) {
            (Some(v), _) => parts.push(v),
            (None, Some(m)) => parts.push(Sql::new(m)),
            (None, None) => {}
        }
    }
    Sql::join(parts, ", ")
}

/// `(a, b), (c, d)` value rows.
pub(crate) fn push_rows(sql: &mut Sql, rows: Vec<Sql>) {
    for (i, row) in rows.into_iter().enumerate() {
        if i > 0 {
            sql.push(", ");
        }
        sql.push("(");
        sql.push_sql(row);
        sql.push(")");
    }
}

pub(crate) fn push_returning(sql: &mut Sql, returning: &[String]) {
    if !returning.is_empty() {
        sql.push(" RETURNING ");
        sql.push(&comma_list(returning));
    }
}
