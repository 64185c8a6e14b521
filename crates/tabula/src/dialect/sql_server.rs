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

/// SQL Server: `[bracketed]` names, `@name` placeholders, `MERGE` upserts and
/// `OUTPUT` clauses.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDialect;

impl SqlServerDialect {
    fn output(prefix: &str, columns: &[String]) -> String {
        let cols: Vec<String> = columns.iter().map(|c| format!("{prefix}.{c}")).collect();
        format!(" OUTPUT {}", comma_list(&cols))
    }

    fn with_identity_insert(table: &str, enabled: bool, body: Sql) -> Sql {
        if !enabled {
            return body;
        }
        let mut sql = Sql::new(format!("SET IDENTITY_INSERT {table} ON;\n"));
        sql.push_sql(body);
        sql.push(&format!(";\nSET IDENTITY_INSERT {table} OFF;"));
        sql
    }
}

impl Dialect for SqlServerDialect {
    fn name(&self) -> &'static str {
        "SQL Server"
    }

    fn quote_delimiters(&self) -> (char, char) {
        ('[', ']')
    }

    fn default_schema(&self) -> Option<&'static str> {
        Some("dbo")
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Named('@')
    }

    fn max_parameters(&self) -> Option<usize> {
        Some(2100)
    }

    fn max_rows_per_statement(&self) -> Option<usize> {
        Some(1000)
    }

    fn native_type_kind(
        &self,
        native_type: &str,
        max_length: Option<i32>,
        _is_unsigned: bool,
    ) -> Option<ValueKind> {
        let kind = match base_type_name(native_type).as_str() {
            "bit" => ValueKind::Bool,
            "tinyint" => ValueKind::U8,
            "smallint" => ValueKind::I16,
            "int" => ValueKind::I32,
            "bigint" => ValueKind::I64,
            "real" => ValueKind::F32,
            "float" => ValueKind::F64,
            "decimal" | "numeric" | "money" | "smallmoney" => ValueKind::Decimal,
            "char" | "nchar" if max_length == Some(1) => ValueKind::Char,
            "char" | "nchar" | "varchar" | "nvarchar" | "text" | "ntext" | "xml" | "sysname" => {
                ValueKind::String
            }
            "binary" | "varbinary" | "image" | "rowversion" | "timestamp" => ValueKind::Bytes,
            "date" => ValueKind::Date,
            "time" => ValueKind::Time,
            "datetime" | "datetime2" | "smalldatetime" => ValueKind::DateTime,
            "datetimeoffset" => ValueKind::Timestamp,
            "uniqueidentifier" => ValueKind::Uuid,
            _ => return None,
        };
        Some(kind)
    }

    fn bool_literal(&self, value: bool) -> &'static str {
        if value { "1" } else { "0" }
    }

    fn bytes_literal(&self, bytes: &[u8]) -> String {
        format!("0x{}", super::hex(bytes))
    }

    fn supports_routine(&self, _kind: RoutineKind) -> bool {
        true
    }

    fn supports_limit(&self, options: LimitOptions) -> bool {
        options != LimitOptions::TableSampleBernoulliPercentage
    }

    fn limit_requires_sort(&self, limit: &Limit) -> bool {
        match limit.options {
            LimitOptions::RowsWithTies | LimitOptions::PercentageWithTies => true,
            LimitOptions::Rows => limit.skip.is_some_and(|s| s > 0),
            _ => false,
        }
    }

    fn render_insert(&self, stmt: InsertStatement) -> Sql {
        let mut sql = Sql::new(format!("INSERT INTO {}", stmt.table));
        let default_values = stmt.rows.iter().all(Sql::is_empty) || stmt.columns.is_empty();
        if !default_values {
            sql.push(&format!(" ({})", comma_list(&stmt.columns)));
        }
        if !stmt.returning.is_empty() {
            sql.push(&Self::output("Inserted", &stmt.returning));
        }
        if default_values {
            sql.push(" DEFAULT VALUES");
        } else {
            sql.push(" VALUES ");
            push_rows(&mut sql, stmt.rows);
        }
        Self::with_identity_insert(&stmt.table, stmt.identity_insert, sql)
    }

    fn render_update(&self, stmt: UpdateStatement) -> Sql {
        let mut sql = Sql::new(format!("UPDATE {} SET ", stmt.table));
        sql.push_sql(stmt.set);
        if !stmt.returning.is_empty() {
            sql.push(&Self::output("Inserted", &stmt.returning));
        }
        push_where(&mut sql, stmt.filter);
        sql
    }

    fn render_delete(&self, stmt: DeleteStatement) -> Sql {
        let mut sql = Sql::new(format!("DELETE FROM {}", stmt.table));
        if !stmt.returning.is_empty() {
            sql.push(&Self::output("Deleted", &stmt.returning));
        }
        push_where(&mut sql, stmt.filter);
        sql
    }

    fn render_upsert(&self, stmt: UpsertStatement) -> Sql {
        let mut sql = Sql::new(format!(
            "MERGE INTO {} WITH (HOLDLOCK) AS target USING (VALUES (",
            stmt.table
        ));
        sql.push_sql(stmt.values);

        let on: Vec<String> = stmt
            .key_columns
            .iter()
            .map(|k| format!("target.{k} = source.{k}"))
            .collect();
        sql.push(&format!(
            ")) AS source ({}) ON {}",
            comma_list(&stmt.columns),
            on.join(" AND ")
        ));

        if !stmt.update_columns.is_empty() {
            sql.push(" WHEN MATCHED THEN UPDATE SET ");
            sql.push(&assignments(&stmt.update_columns, |c| format!("source.{c}")));
        }

        let source_values: Vec<String> = stmt.columns.iter().map(|c| format!("source.{c}")).collect();
        sql.push(&format!(
            " WHEN NOT MATCHED THEN INSERT ({}) VALUES ({})",
            comma_list(&stmt.columns),
            comma_list(&source_values)
        ));
        if !stmt.returning.is_empty() {
            sql.push(&Self::output("Inserted", &stmt.returning));
        }
        if !stmt.identity_insert {
            sql.push(";");
        }
        Self::with_identity_insert(&stmt.table, stmt.identity_insert, sql)
    }

    fn render_select(&self, stmt: SelectStatement) -> TabulaResult<Sql> {
        let mut sql = Sql::new("SELECT ");

        if let Some(limit) = &stmt.limit {
            let top = match (limit.options, limit.take) {
                (LimitOptions::Rows, Some(take)) if limit.skip.unwrap_or(0) == 0 => {
                    Some(format!("TOP ({take}) "))
                }
                (LimitOptions::Percentage, Some(take)) => Some(format!("TOP ({take}) PERCENT ")),
                (LimitOptions::RowsWithTies, Some(take)) => {
                    Some(format!("TOP ({take}) WITH TIES "))
                }
                (LimitOptions::PercentageWithTies, Some(take)) => {
                    Some(format!("TOP ({take}) PERCENT WITH TIES "))
                }
                _ => None,
            };
            if let Some(top) = top {
                sql.push(&top);
            }
        }

        sql.push(&format!("{} FROM ", render_projection(&stmt.projection)));
        sql.push_sql(stmt.source);

        if let Some(limit) = &stmt.limit {
            let sample = match (limit.options, limit.take) {
                (LimitOptions::TableSampleSystemRows, Some(take)) => Some(format!("{take} ROWS")),
                (LimitOptions::TableSampleSystemPercentage, Some(take)) => {
                    Some(format!("{take} PERCENT"))
                }
                (LimitOptions::TableSampleBernoulliPercentage, _) => {
                    return Err(self.unsupported("limit option TableSampleBernoulliPercentage").into());
                }
                _ => None,
            };
            if let Some(sample) = sample {
                sql.push(&format!(" TABLESAMPLE SYSTEM ({sample})"));
                if let Some(seed) = limit.seed {
                    sql.push(&format!(" REPEATABLE ({seed})"));
                }
            }
        }

        push_where(&mut sql, stmt.filter);
        push_order_by(&mut sql, &stmt.order_by);

        if let Some(limit) = &stmt.limit {
            if limit.options == LimitOptions::Rows {
                if let Some(skip) = limit.skip.filter(|s| *s > 0) {
                    sql.push(&format!(" OFFSET {skip} ROWS"));
                    if let Some(take) = limit.take {
                        sql.push(&format!(" FETCH NEXT {take} ROWS ONLY"));
                    }
                }
            }
        }
        Ok(sql)
    }

    fn render_call(&self, mut call: RoutineCall) -> TabulaResult<Sql> {
        match call.kind {
            RoutineKind::StoredProcedure => {
                let mut args = Vec::new();
                for arg in call.arguments {
                    let declared = if arg.name.starts_with('@') {
                        arg.name.clone()
                    } else {
                        format!("@{}", arg.name)
                    };
                    // Unsupplied parameters are left out so their declared defaults apply.
                    if let Some(value) = arg.value {
                        let mut a = Sql::new(format!("{declared} = "));
                        a.push_sql(value);
                        if arg.direction.is_output() {
                            a.push(" OUTPUT");
                        }
                        args.push(a);
                    }
                }
                let mut sql = Sql::new(format!("EXEC {}", call.name));
                if !args.is_empty() {
                    sql.push(" ");
                    sql.push_sql(Sql::join(args, ", "));
                }
                Ok(sql)
            }
            RoutineKind::ScalarFunction | RoutineKind::TableFunction => {
                let prefix = if call.kind == RoutineKind::ScalarFunction {
                    "SELECT "
                } else {
                    ""
                };
                let missing = if call.raw { None } else { Some("DEFAULT") };
                let args = positional_arguments(&mut call, missing);
                let mut sql = Sql::new(format!("{prefix}{}(", call.name));
                sql.push_sql(args);
                sql.push(")");
                Ok(sql)
            }
        }
    }
}
