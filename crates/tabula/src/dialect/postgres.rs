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

/// PostgreSQL: `"quoted"` names, `$n` placeholders, `ON CONFLICT` upserts and
/// `RETURNING`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "PostgreSQL"
    }

    fn quote_delimiters(&self) -> (char, char) {
        ('"', '"')
    }

    fn default_schema(&self) -> Option<&'static str> {
        Some("public")
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Numbered
    }

    fn max_parameters(&self) -> Option<usize> {
        Some(65535)
    }

    fn native_type_kind(
        &self,
        native_type: &str,
        max_length: Option<i32>,
        _is_unsigned: bool,
    ) -> Option<ValueKind> {
        let kind = match base_type_name(native_type).as_str() {
            "bool" | "boolean" => ValueKind::Bool,
            "int2" | "smallint" | "smallserial" => ValueKind::I16,
            "int" | "int4" | "integer" | "serial" | "serial4" => ValueKind::I32,
            "int8" | "bigint" | "bigserial" | "serial8" => ValueKind::I64,
            "float4" | "real" => ValueKind::F32,
            "float8" | "double precision" => ValueKind::F64,
            "numeric" | "decimal" | "money" => ValueKind::Decimal,
            "char" | "character" | "bpchar" if max_length == Some(1) => ValueKind::Char,
            "char" | "character" | "bpchar" | "varchar" | "character varying" | "text" | "name"
            | "citext" => ValueKind::String,
            "bytea" => ValueKind::Bytes,
            "date" => ValueKind::Date,
            "time" | "time without time zone" => ValueKind::Time,
            "timestamp" | "timestamp without time zone" => ValueKind::DateTime,
            "timestamptz" | "timestamp with time zone" => ValueKind::Timestamp,
            "uuid" => ValueKind::Uuid,
            "json" | "jsonb" => ValueKind::Json,
            _ => return None,
        };
        Some(kind)
    }

    fn bytes_literal(&self, bytes: &[u8]) -> String {
        format!("'\\x{}'::bytea", super::hex(bytes))
    }

    fn supports_routine(&self, _kind: RoutineKind) -> bool {
        true
    }

    fn supports_limit(&self, options: LimitOptions) -> bool {
        matches!(
            options,
            LimitOptions::None
                | LimitOptions::Rows
                | LimitOptions::RowsWithTies
                | LimitOptions::TableSampleSystemPercentage
                | LimitOptions::TableSampleBernoulliPercentage
        )
    }

    fn limit_requires_sort(&self, limit: &Limit) -> bool {
        limit.options == LimitOptions::RowsWithTies
    }

    fn render_insert(&self, stmt: InsertStatement) -> Sql {
        let mut sql = Sql::new(format!("INSERT INTO {}", stmt.table));
        if stmt.rows.iter().all(Sql::is_empty) || stmt.columns.is_empty() {
            sql.push(" DEFAULT VALUES");
        } else {
            sql.push(&format!(" ({})", comma_list(&stmt.columns)));
            if stmt.identity_insert {
                sql.push(" OVERRIDING SYSTEM VALUE");
            }
            sql.push(" VALUES ");
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
            "INSERT INTO {} ({})",
            stmt.table,
            comma_list(&stmt.columns)
        ));
        if stmt.identity_insert {
            sql.push(" OVERRIDING SYSTEM VALUE");
        }
        sql.push(" VALUES (");
        sql.push_sql(stmt.values);
        sql.push(&format!(") ON CONFLICT ({}) DO UPDATE SET ", comma_list(&stmt.key_columns)));
        // With nothing else to update, re-assign the key so the existing row is still reported.
        let update = if stmt.update_columns.is_empty() {
            &stmt.key_columns
        } else {
            &stmt.update_columns
        };
        sql.push(&assignments(update, |c| format!("EXCLUDED.{c}")));
        push_returning(&mut sql, &stmt.returning);
        sql
    }

    fn render_select(&self, stmt: SelectStatement) -> TabulaResult<Sql> {
        let mut sql = Sql::new(format!("SELECT {} FROM ", render_projection(&stmt.projection)));
        sql.push_sql(stmt.source);

        if let Some(limit) = &stmt.limit {
            let method = match limit.options {
                LimitOptions::TableSampleSystemPercentage => Some("SYSTEM"),
                LimitOptions::TableSampleBernoulliPercentage => Some("BERNOULLI"),
                _ => None,
            };
            if let (Some(method), Some(take)) = (method, limit.take) {
                sql.push(&format!(" TABLESAMPLE {method} ({take})"));
                if let Some(seed) = limit.seed {
                    sql.push(&format!(" REPEATABLE ({seed})"));
                }
            }
        }

        push_where(&mut sql, stmt.filter);
        push_order_by(&mut sql, &stmt.order_by);

        if let Some(limit) = &stmt.limit {
            match limit.options {
                LimitOptions::Rows => {
                    if let Some(take) = limit.take {
                        sql.push(&format!(" LIMIT {take}"));
                    }
                    if let Some(skip) = limit.skip.filter(|s| *s > 0) {
                        sql.push(&format!(" OFFSET {skip}"));
                    }
                }
                LimitOptions::RowsWithTies => {
                    if let Some(take) = limit.take {
                        sql.push(&format!(" FETCH FIRST {take} ROWS WITH TIES"));
                    }
                }
                LimitOptions::None
                | LimitOptions::TableSampleSystemPercentage
                | LimitOptions::TableSampleBernoulliPercentage => {}
                other => return Err(self.unsupported(&format!("limit option {other:?}")).into()),
            }
        }
        Ok(sql)
    }

    fn render_call(&self, call: RoutineCall) -> TabulaResult<Sql> {
        // Named notation lets unmatched parameters fall back to their declared defaults.
        let mut args = Vec::new();
        for arg in call.arguments {
            if let Some(value) = arg.value {
                let mut a = Sql::new(format!("{} => ", self.quote_identifier(&arg.variable_name)));
                a.push_sql(value);
                args.push(a);
            }
        }
        let args = Sql::join(args, ", ");

        let mut sql = match call.kind {
            RoutineKind::StoredProcedure => Sql::new(format!("CALL {}(", call.name)),
            RoutineKind::ScalarFunction => Sql::new(format!("SELECT {}(", call.name)),
            RoutineKind::TableFunction => Sql::new(format!("{}(", call.name)),
        };
        sql.push_sql(args);
        sql.push(")");
        Ok(sql)
    }
}
