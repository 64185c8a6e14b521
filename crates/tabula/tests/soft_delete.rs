use std::sync::{Arc, Mutex};

use tabula::prelude::*;
use tabula::{ColumnDef, MappingError, RowCountCheck, TableDef, ValidationError};

fn data_source() -> DataSource {
    let snapshot = SchemaSnapshot::new()
        .table(
            TableDef::table("Account")
                .column(ColumnDef::new("Id", "int4").primary_key())
                .column(ColumnDef::new("Name", "text"))
                .column(ColumnDef::new("IsDeleted", "bool").nullable()),
        )
        .table(
            TableDef::table("Tag")
                .column(ColumnDef::new("Id", "int4").primary_key())
                .column(ColumnDef::new("Name", "text")),
        );
    let cache = SchemaCache::new(Arc::new(PostgresDialect), Arc::new(snapshot));
    DataSource::new(Arc::new(cache))
        .with_audit_policy(Arc::new(SoftDeletePolicy::new().rule("IsDeleted", true)))
}

/// In-memory `Account` rows: `(id, name, is_deleted)`.
///
/// Applies soft-delete statements the way the guarded UPDATE would: only
/// rows whose marker is not already set count as affected.
struct Accounts {
    rows: Mutex<Vec<(i64, &'static str, Option<bool>)>>,
}

impl Accounts {
    fn new() -> Self {
        Self {
            rows: Mutex::new(vec![(7, "Bob", None), (8, "Bob", None), (9, "Eve", Some(false))]),
        }
    }
}

impl Executor for Accounts {
    fn execute(&self, stmt: &PreparedStatement) -> TabulaResult<u64> {
        assert!(stmt.text.starts_with("UPDATE "), "not a soft delete: {}", stmt.text);
        let param = |name: &str| {
            stmt.parameters
                .iter()
                .find(|p| p.name == name)
                .map(|p| p.value.clone())
        };
        let id = param("Id");
        let name = param("Name");

        let mut affected = 0;
        for row in self.rows.lock().unwrap().iter_mut() {
            let matched = id.as_ref().is_none_or(|v| *v == Value::Int(row.0))
                && name.as_ref().is_none_or(|v| *v == Value::from(row.1));
            if matched && row.2 != Some(true) {
                row.2 = Some(true);
                affected += 1;
            }
        }
        Ok(affected)
    }
}

#[test]
fn delete_becomes_a_guarded_update() {
    let ds = data_source();
    let stmt = ds
        .delete_by_key("Account", 7)
        .unwrap()
        .prepare(&DesiredColumns::NoColumns)
        .unwrap();
    assert_eq!(
        stmt.text,
        "UPDATE \"public\".\"Account\" SET \"IsDeleted\" = $1 WHERE (\"Id\" = $2) \
         AND (\"IsDeleted\" IS NULL OR \"IsDeleted\" <> $1)"
    );
    assert_eq!(stmt.parameters[0].value, Value::Bool(true));
    assert_eq!(stmt.row_count_check, Some(RowCountCheck::Exactly(1)));
}

#[test]
fn object_delete_is_rewritten_too() {
    let ds = data_source();
    let sql = ds.delete("Account", 7).unwrap().to_sql().unwrap();
    assert!(sql.starts_with("UPDATE \"public\".\"Account\" SET \"IsDeleted\" = $1"));
}

#[test]
fn tables_without_the_marker_are_hard_deleted() {
    let ds = data_source();
    let sql = ds.delete_by_key("Tag", 1).unwrap().to_sql().unwrap();
    assert_eq!(sql, "DELETE FROM \"public\".\"Tag\" WHERE \"Id\" = $1");
}

#[test]
fn keyed_soft_delete_twice_fails_the_row_check() {
    let ds = data_source();
    let db = Accounts::new();
    let cmd = ds.delete_by_key("Account", 7).unwrap();

    assert_eq!(cmd.execute(&db).unwrap(), 1);
    let err = cmd.execute(&db).unwrap_err();
    assert!(err.is_row_count());
}

#[test]
fn set_based_soft_delete_is_idempotent() {
    let ds = data_source();
    let db = Accounts::new();
    let cmd = ds
        .delete_set("Account")
        .unwrap()
        .with_filter(Record::new().with("Name", "Bob"));

    assert_eq!(cmd.execute(&db).unwrap(), 2);
    assert_eq!(cmd.execute(&db).unwrap(), 0);
}

#[test]
fn filter_on_the_marker_column_binds_separately() {
    let ds = data_source();
    let stmt = ds
        .delete_set("Account")
        .unwrap()
        .with_filter(Record::new().with("IsDeleted", false))
        .prepare(&DesiredColumns::NoColumns)
        .unwrap();
    assert_eq!(
        stmt.text,
        "UPDATE \"public\".\"Account\" SET \"IsDeleted\" = $1 WHERE (\"IsDeleted\" = $2) \
         AND (\"IsDeleted\" IS NULL OR \"IsDeleted\" <> $1)"
    );
    let params: Vec<_> = stmt
        .parameters
        .iter()
        .map(|p| (p.name.as_str(), p.value.clone()))
        .collect();
    assert_eq!(
        params,
        [("IsDeleted_deleted", Value::Bool(true)), ("IsDeleted", Value::Bool(false))]
    );
}

#[test]
fn all_rows_soft_delete_only_has_the_guard() {
    let ds = data_source();
    let sql = ds.delete_set("Account").unwrap().all_rows().to_sql().unwrap();
    assert_eq!(
        sql,
        "UPDATE \"public\".\"Account\" SET \"IsDeleted\" = $1 \
         WHERE (\"IsDeleted\" IS NULL OR \"IsDeleted\" <> $1)"
    );

    let db = Accounts::new();
    let cmd = ds.delete_set("Account").unwrap().all_rows();
    assert_eq!(cmd.execute(&db).unwrap(), 3);
}

#[test]
fn set_commands_require_a_filter() {
    let ds = data_source();
    let err = ds.delete_set("Tag").unwrap().to_sql().unwrap_err();
    assert!(matches!(
        err,
        TabulaError::Validation(ValidationError::MissingFilter { .. })
    ));

    let err = ds
        .update_set("Tag", Record::new().with("Name", "x"))
        .unwrap()
        .to_sql()
        .unwrap_err();
    assert!(matches!(
        err,
        TabulaError::Validation(ValidationError::MissingFilter { .. })
    ));

    let sql = ds
        .update_set("Tag", Record::new().with("Name", "x"))
        .unwrap()
        .all_rows()
        .to_sql()
        .unwrap();
    assert_eq!(sql, "UPDATE \"public\".\"Tag\" SET \"Name\" = $1");
}

#[test]
fn expected_rows_opt_in_for_set_commands() {
    let ds = data_source();
    let stmt = ds
        .delete_set("Tag")
        .unwrap()
        .with_where("\"Name\" LIKE @pattern", Some(Record::new().with("pattern", "tmp%")))
        .expected_rows(2)
        .prepare(&DesiredColumns::NoColumns)
        .unwrap();
    assert_eq!(stmt.text, "DELETE FROM \"public\".\"Tag\" WHERE \"Name\" LIKE $1");
    assert_eq!(stmt.row_count_check, Some(RowCountCheck::Exactly(2)));
}

#[test]
fn one_name_bound_to_two_values_is_rejected() {
    let ds = data_source();
    let err = ds
        .update_set_expression(
            "Tag",
            "\"Name\" = @Name",
            Some(Record::new().with("Name", "a")),
        )
        .unwrap()
        .with_where("\"Name\" = @Name", Some(Record::new().with("Name", "b")))
        .to_sql()
        .unwrap_err();
    assert!(matches!(
        err,
        TabulaError::Mapping(MappingError::DuplicateParameter { ref name }) if name == "Name"
    ));

    let sql = ds
        .update_set_expression(
            "Tag",
            "\"Name\" = UPPER(@Name)",
            Some(Record::new().with("Name", "a")),
        )
        .unwrap()
        .with_where("\"Name\" = @Name", Some(Record::new().with("Name", "a")))
        .to_sql()
        .unwrap();
    assert_eq!(
        sql,
        "UPDATE \"public\".\"Tag\" SET \"Name\" = UPPER($1) WHERE \"Name\" = $1"
    );
}
