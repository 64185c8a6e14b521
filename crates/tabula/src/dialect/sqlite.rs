use super::statement::{
    DeleteStatement, InsertStatement, RoutineCall, SelectStatement, UpdateStatement,
    UpsertStatement,
};
use super::{
    Dialect, assignments, base_type_name, comma_list, push_order_by, push_returning, push_rows,
    push_where, render_projection,
};
use crate::command::{Limit, LimitOptions};
use crate::error::TabulaResult;
use crate::metadata::RoutineKind;
use crate::sql::{PlaceholderStyle, Sql};
use crate::value::ValueKind;

/// SQLite: `"quoted"` names, `@name` placeholders, `ON CONFLICT` and
/// `RETURNING`. SQLite has no stored routines.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "SQLite"
    }

    fn quote_delimiters(&self) -> (char, char) {
        ('"', '"')
    }

    fn default_schema(&self) -> Option<&'static str> {
        None
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Named('@')
    }

    fn max_parameters(&self) -> Option<usize> {
        Some(999)
    }

    /// Declared types resolve by SQLite's affinity rules, with the common
    /// date, boolean and uuid spellings recognized first.
    fn native_type_kind(
        &self,
        native_type: &str,
        _max_length: Option<i32>,
        _is_unsigned: bool,
    ) -> Option<ValueKind> {
        let base = base_type_name(native_type);
        let kind = match base.as_str() {
            "bool" | "boolean" => ValueKind::Bool,
            "date" => ValueKind::Date,
            "time" => ValueKind::Time,
            "datetime" | "timestamp" => ValueKind::DateTime,
            "numeric" | "decimal" | "money" => ValueKind::Decimal,
            "uuid" | "guid" | "uniqueidentifier" => ValueKind::Uuid,
            "json" => ValueKind::Json,
            "" | "blob" => ValueKind::Bytes,
            t if t.contains("int") => ValueKind::I64,
            t if t.contains("char") || t.contains("clob") || t.contains("text") => {
                ValueKind::String
            }
            t if t.contains("real") || t.contains("floa") || t.contains("doub") => ValueKind::F64,
            _ => return None,
        };
        Some(kind)
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        if value { "1" } else { "0" }
    }

    fn supports_routine(&self, _kind: RoutineKind) -> bool {
        false
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
            sql.push(" DEFAULT VALUES");
        } else {
            sql.push(&format!(" ({}) VALUES ", comma_list(&stmt.columns)));
            push_rows(&mut sql, stmt.rows);
        }
        push_returning(&mut sql, &stmt.returning);
        sql
    }

    fn render_update(&self, stmt: UpdateStatement) -> Sql {
        let mut sql = Sql::new(format!("UPDATE {} SET ", stmt.table));
        sql.push_sql(stmt.set);
        push_where(&mut sql, stmt.filter);
        push_returning(&mut sql, &stmt.returning);
        sql
    }

    fn render_delete(&self, stmt: DeleteStatement) -> Sql {
        let mut sql = Sql::new(format!("DELETE FROM {}", stmt.table));
        push_where(&mut sql, stmt.filter);
        push_returning(&mut sql, &stmt.returning);
        sql
    }

    fn render_upsert(&self, stmt: UpsertStatement) -> Sql {
        let mut sql = Sql::new(format!(
            "INSERT INTO {} ({}) VALUES (",
            stmt.table,
            comma_list(&stmt.columns)
        ));
        sql.push_sql(stmt.values);
        sql.push(&format!(") ON CONFLICT ({}) DO UPDATE SET ", comma_list(&stmt.key_columns)));
        let update = if stmt.update_columns.is_empty() {
            &stmt.key_columns
        } else {
            &stmt.update_columns
        };
        sql.push(&assignments(update, |c| format!("excluded.{c}")));
        push_returning(&mut sql, &stmt.returning);
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
                    let skip = limit.skip.filter(|s| *s > 0);
                    match (limit.take, skip) {
                        (Some(take), _) => {
                            sql.push(&format!(" LIMIT {take}"));
                        }
                        (None, Some(_)) => {
                            sql.push(" LIMIT -1");
                        }
                        (None, None) => {}
                    }
                    if let Some(skip) = skip {
                        sql.push(&format!(" OFFSET {skip}"));
                    }
                }
                other => return Err(self.unsupported(&format!("limit option {other:?}")).into()),
            }
        }
        Ok(sql)
    }

    fn render_call(&self, call: RoutineCall) -> TabulaResult<Sql> {
        Err(self.unsupported(&format!("{}s", call.kind)).into())
    }
}
