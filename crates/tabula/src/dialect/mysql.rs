use super::statement::{
    DeleteStatement, InsertStatement, RoutineCall, SelectStatement, UpdateStatement,
    UpsertStatement,
};
use super::{
    Dialect, assignments, base_type_name, comma_list, positional_arguments, push_order_by,
    push_rows, push_where, render_projection,
};
use crate::command::{Limit, LimitOptions};
use crate::error::TabulaResult;
use crate::metadata::RoutineKind;
use crate::sql::{PlaceholderStyle, Sql};
use crate::value::ValueKind;

/// MySQL: `` `backtick` `` names, `?` placeholders and `ON DUPLICATE KEY UPDATE`.
///
/// MySQL has no `RETURNING`; a single generated key is read back with
/// `LAST_INSERT_ID()` after the insert.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "MySQL"
    }

    fn quote_delimiters(&self) -> (char, char) {
        ('`', '`')
    }

    fn default_schema(&self) -> Option<&'static str> {
        None
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Positional
    }

    fn max_parameters(&self) -> Option<usize> {
        Some(65535)
    }

    fn native_type_kind(
        &self,
        native_type: &str,
        max_length: Option<i32>,
        is_unsigned: bool,
    ) -> Option<ValueKind> {
        let base = base_type_name(native_type);
        let unsigned = is_unsigned || native_type.to_lowercase().contains("unsigned");
        let base = base.trim_end_matches(" unsigned");
        let kind = match (base, unsigned) {
            ("bool" | "boolean", _) => ValueKind::Bool,
            ("bit", _) if max_length.unwrap_or(1) == 1 => ValueKind::Bool,
            ("tinyint", _) if max_length == Some(1) => ValueKind::Bool,
            ("tinyint", false) => ValueKind::I8,
            ("tinyint", true) => ValueKind::U8,
            ("smallint" | "year", false) => ValueKind::I16,
            ("smallint" | "year", true) => ValueKind::U16,
            ("mediumint" | "int" | "integer", false) => ValueKind::I32,
            ("mediumint" | "int" | "integer", true) => ValueKind::U32,
            ("bigint", false) => ValueKind::I64,
            ("bigint", true) => ValueKind::U64,
            ("float", _) => ValueKind::F32,
            ("double" | "real", _) => ValueKind::F64,
            ("decimal" | "numeric", _) => ValueKind::Decimal,
            ("char", _) if max_length == Some(1) => ValueKind::Char,
            ("char" | "varchar" | "tinytext" | "text" | "mediumtext" | "longtext" | "enum" | "set", _) => {
                ValueKind::String
            }
            ("binary" | "varbinary" | "tinyblob" | "blob" | "mediumblob" | "longblob" | "bit", _) => {
                ValueKind::Bytes
            }
            ("date", _) => ValueKind::Date,
            ("time", _) => ValueKind::Time,
            ("datetime", _) => ValueKind::DateTime,
            ("timestamp", _) => ValueKind::Timestamp,
            ("json", _) => ValueKind::Json,
            _ => return None,
        };
        Some(kind)
    }

    fn supports_routine(&self, kind: RoutineKind) -> bool {
        kind != RoutineKind::TableFunction
    }

    fn supports_limit(&self, options: LimitOptions) -> bool {
        matches!(options, LimitOptions::None | LimitOptions::Rows)
    }

    fn limit_requires_sort(&self, _limit: &Limit) -> bool {
        false
    }

    fn render_insert(&self, stmt: InsertStatement) -> Sql {
        let mut sql = Sql::new(format!("INSERT INTO {}", stmt.table));
        if stmt.rows.iter().all(Sql::is_empty) || stmt.columns.is_empty() {
            sql.push(" () VALUES ()");
        } else {
            sql.push(&format!(" ({}) VALUES ", comma_list(&stmt.columns)));
            push_rows(&mut sql, stmt.rows);
        }
        if let (Some(key), false) = (&stmt.generated_key, stmt.returning.is_empty()) {
            sql.push(&format!(
                ";\nSELECT {} FROM {} WHERE {key} = LAST_INSERT_ID()",
                comma_list(&stmt.returning),
                stmt.table
            ));
        }
        sql
    }

    fn render_update(&self, stmt: UpdateStatement) -> Sql {
        let mut sql = Sql::new(format!("UPDATE {} SET ", stmt.table));
        sql.push_sql(stmt.set);
        push_where(&mut sql, stmt.filter);
        sql
    }

    fn render_delete(&self, stmt: DeleteStatement) -> Sql {
        let mut sql = Sql::new(format!("DELETE FROM {}", stmt.table));
        push_where(&mut sql, stmt.filter);
        sql
    }

    fn render_upsert(&self, stmt: UpsertStatement) -> Sql {
        let mut sql = Sql::new(format!(
            "INSERT INTO {} ({}) VALUES (",
            stmt.table,
            comma_list(&stmt.columns)
        ));
        sql.push_sql(stmt.values);
        sql.push(") ON DUPLICATE KEY UPDATE ");
        let update = if stmt.update_columns.is_empty() {
            &stmt.key_columns
        } else {
            &stmt.update_columns
        };
        sql.push(&assignments(update, |c| format!("VALUES({c})")));
        sql
    }

    fn render_select(&self, stmt: SelectStatement) -> TabulaResult<Sql> {
        let mut sql = Sql::new(format!("SELECT {} FROM ", render_projection(&stmt.projection)));
        sql.push_sql(stmt.source);
        push_where(&mut sql, stmt.filter);
        push_order_by(&mut sql, &stmt.order_by);

        if let Some(limit) = &stmt.limit {
            match limit.options {
                LimitOptions::None => {}
                LimitOptions::Rows => {
                    let skip = limit.skip.unwrap_or(0);
                    let clause = match (limit.take, skip) {
                        (Some(take), 0) => format!(" LIMIT {take}"),
                        (Some(take), skip) => format!(" LIMIT {skip}, {take}"),
                        (None, 0) => String::new(),
                        // MySQL has no OFFSET without LIMIT.
                        (None, skip) => format!(" LIMIT {skip}, 18446744073709551615"),
                    };
                    sql.push(&clause);
                }
                other => return Err(self.unsupported(&format!("limit option {other:?}")).into()),
            }
        }
        Ok(sql)
    }

    fn render_call(&self, mut call: RoutineCall) -> TabulaResult<Sql> {
        let prefix = match call.kind {
            RoutineKind::StoredProcedure => "CALL",
            RoutineKind::ScalarFunction => "SELECT",
            RoutineKind::TableFunction => return Err(self.unsupported("table functions").into()),
        };
        let missing = if call.raw { None } else { Some("NULL") };
        let args = positional_arguments(&mut call, missing);
        let mut sql = Sql::new(format!("{prefix} {}(", call.name));
        sql.push_sql(args);
        sql.push(")");
        Ok(sql)
    }
}
