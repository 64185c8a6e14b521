use std::sync::{Arc, Mutex};

use tabula::prelude::*;
use tabula::{
    ColumnDef, MappingError, OperationKind, RowCountCheck, TableDef, UpsertPlan, ValidationError,
};

fn sql_server() -> DataSource {
    let snapshot = SchemaSnapshot::new()
        .table(
            TableDef::table("dbo.Customer")
                .column(ColumnDef::new("Id", "int").primary_key().identity())
                .column(ColumnDef::new("Name", "nvarchar"))
                .column(ColumnDef::new("Email", "nvarchar").nullable()),
        )
        .table(
            TableDef::view("dbo.ActiveCustomer")
                .base_table("dbo.Customer")
                .column(ColumnDef::new("Id", "int"))
                .column(ColumnDef::new("Name", "nvarchar")),
        )
        .table(TableDef::table("dbo.AuditLog").column(ColumnDef::new("Message", "nvarchar")))
        .table(
            TableDef::table("dbo.Link")
                .column(ColumnDef::new("A", "int").primary_key())
                .column(ColumnDef::new("B", "int").primary_key()),
        );
    let cache = SchemaCache::new(Arc::new(SqlServerDialect), Arc::new(snapshot));
    DataSource::new(Arc::new(cache))
}

fn postgres() -> DataSource {
    let snapshot = SchemaSnapshot::new()
        .table(
            TableDef::table("public.Product")
                .column(ColumnDef::new("Id", "int4").primary_key().identity())
                .column(ColumnDef::new("Name", "text")),
        )
        .table(
            TableDef::table("public.Setting")
                .column(ColumnDef::new("Key", "text").primary_key())
                .column(ColumnDef::new("Value", "text").nullable()),
        );
    let cache = SchemaCache::new(Arc::new(PostgresDialect), Arc::new(snapshot));
    DataSource::new(Arc::new(cache))
}

/// Replays canned row counts and records every statement it runs.
#[derive(Default)]
struct Scripted {
    rows: Mutex<Vec<u64>>,
    seen: Mutex<Vec<PreparedStatement>>,
}

impl Scripted {
    fn returning(rows: &[u64]) -> Self {
        let mut rows = rows.to_vec();
        rows.reverse();
        Self {
            rows: Mutex::new(rows),
            seen: Mutex::default(),
        }
    }
}

impl Executor for Scripted {
    fn execute(&self, stmt: &PreparedStatement) -> TabulaResult<u64> {
        self.seen.lock().unwrap().push(stmt.clone());
        self.rows
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| TabulaError::execution("no rows scripted"))
    }
}

#[test]
fn insert_omits_identity_and_reads_back_the_key() {
    let ds = sql_server();
    let cmd = ds
        .insert(
            "Customer",
            Record::new().with("Name", "Ann").with("Email", "a@b.com"),
        )
        .unwrap();
    let stmt = cmd.prepare(&DesiredColumns::Auto).unwrap();

    assert_eq!(
        stmt.text,
        "INSERT INTO [dbo].[Customer] ([Name], [Email]) OUTPUT Inserted.[Id] VALUES (@Name, @Email)"
    );
    let names: Vec<_> = stmt.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Name", "Email"]);
    assert_eq!(stmt.row_count_check, Some(RowCountCheck::Exactly(1)));
    assert_eq!(stmt.operation, OperationKind::Insert);
}

#[test]
fn update_by_key_expects_exactly_one_row() {
    let ds = sql_server();
    let cmd = ds
        .update_by_key("Customer", 5, Record::new().with("Name", "Ann2"))
        .unwrap();
    let stmt = cmd.prepare(&DesiredColumns::NoColumns).unwrap();

    assert_eq!(
        stmt.text,
        "UPDATE [dbo].[Customer] SET [Name] = @Name WHERE [Id] = @Id"
    );
    assert_eq!(stmt.parameters[1].value, Value::Int(5));
    assert_eq!(stmt.row_count_check, Some(RowCountCheck::Exactly(1)));

    let db = Scripted::returning(&[1]);
    assert_eq!(cmd.execute(&db).unwrap(), 1);

    let db = Scripted::returning(&[0]);
    let err = cmd.execute(&db).unwrap_err();
    assert!(err.is_row_count());
}

#[test]
fn ignoring_rows_affected_accepts_any_count() {
    let ds = sql_server();
    let cmd = ds
        .update_by_key("Customer", 5, Record::new().with("Name", "Ann2"))
        .unwrap()
        .ignore_rows_affected();

    let db = Scripted::returning(&[0]);
    assert_eq!(cmd.execute(&db).unwrap(), 0);
}

#[test]
fn object_update_uses_the_primary_key() {
    let ds = sql_server();
    let row = Record::new().with("Id", 5).with("Name", "Ann2");
    let cmd = ds.update("Customer", row).unwrap();
    assert_eq!(
        cmd.to_sql().unwrap(),
        "UPDATE [dbo].[Customer] SET [Name] = @Name WHERE [Id] = @Id"
    );

    let db = Scripted::returning(&[2]);
    let err = cmd.execute(&db).unwrap_err();
    let TabulaError::RowCount(e) = err else {
        panic!("expected a row count error");
    };
    assert_eq!(e.actual, 2);
    assert_eq!(e.table, "dbo.Customer");
}

#[test]
fn object_delete_with_output() {
    let ds = sql_server();
    let stmt = ds
        .delete("Customer", 5)
        .unwrap()
        .prepare(&DesiredColumns::explicit(["Name"]))
        .unwrap();
    assert_eq!(
        stmt.text,
        "DELETE FROM [dbo].[Customer] OUTPUT Deleted.[Name] WHERE [Id] = @Id"
    );
}

#[test]
fn keyless_tables_cannot_be_updated_or_deleted() {
    let ds = sql_server();
    let err = ds
        .update("AuditLog", Record::new().with("Message", "x"))
        .unwrap()
        .to_sql()
        .unwrap_err();
    assert!(matches!(
        err,
        TabulaError::Mapping(MappingError::NoUpdateKey { .. })
    ));

    let err = ds
        .delete("AuditLog", Record::new().with("Message", "x"))
        .unwrap()
        .to_sql()
        .unwrap_err();
    assert!(matches!(
        err,
        TabulaError::Mapping(MappingError::NoDeleteKey { .. })
    ));
}

#[test]
fn explicit_key_columns_replace_the_primary_key() {
    let ds = sql_server();
    let row = Record::new().with("Email", "a@b.com").with("Name", "Ann");
    let sql = ds
        .update("Customer", row)
        .unwrap()
        .with_keys(["Email"])
        .to_sql()
        .unwrap();
    assert_eq!(
        sql,
        "UPDATE [dbo].[Customer] SET [Name] = @Name WHERE [Email] = @Email"
    );
}

#[test]
fn by_key_needs_exactly_one_key_column() {
    let ds = sql_server();

    let err = ds.get_by_key("Link", 1).unwrap().to_sql().unwrap_err();
    assert!(matches!(
        err,
        TabulaError::Mapping(MappingError::AmbiguousOrNoKey { key_count: 2, .. })
    ));

    let err = ds.delete_by_key("AuditLog", 1).unwrap().to_sql().unwrap_err();
    assert!(matches!(
        err,
        TabulaError::Mapping(MappingError::AmbiguousOrNoKey { key_count: 0, .. })
    ));
}

#[test]
fn views_fall_back_to_the_base_table_key() {
    let ds = sql_server();
    let stmt = ds
        .get_by_key("ActiveCustomer", 3)
        .unwrap()
        .prepare(&DesiredColumns::AllColumns)
        .unwrap();
    assert_eq!(
        stmt.text,
        "SELECT [Id], [Name] FROM [dbo].[ActiveCustomer] WHERE [Id] = @Id"
    );
}

#[test]
fn unique_columns_can_address_rows() {
    let ds = sql_server();
    let stmt = ds
        .delete_by_keys("Customer", KeyTarget::single("a@b.com").column("Email"))
        .unwrap()
        .prepare(&DesiredColumns::NoColumns)
        .unwrap();
    assert_eq!(stmt.text, "DELETE FROM [dbo].[Customer] WHERE [Email] = @Email");
    assert_eq!(stmt.row_count_check, Some(RowCountCheck::Exactly(1)));
}

#[test]
fn key_lists_expect_one_row_per_distinct_key() {
    let ds = sql_server();
    let stmt = ds
        .delete_by_key_list("Customer", [1, 2, 2, 3])
        .unwrap()
        .prepare(&DesiredColumns::NoColumns)
        .unwrap();
    assert_eq!(
        stmt.text,
        "DELETE FROM [dbo].[Customer] WHERE [Id] IN (@Id_0, @Id_1, @Id_2)"
    );
    assert_eq!(stmt.row_count_check, Some(RowCountCheck::Exactly(3)));

    let err = ds
        .delete_by_key_list("Customer", Vec::<i64>::new())
        .unwrap()
        .to_sql()
        .unwrap_err();
    assert!(matches!(
        err,
        TabulaError::Validation(ValidationError::EmptyKeyList { .. })
    ));
}

#[test]
fn update_by_key_keeps_other_key_like_fields_in_set() {
    let ds = sql_server();
    let sql = ds
        .update_by_key_list(
            "Customer",
            [1, 2],
            Record::new().with("Email", Value::Null),
        )
        .unwrap()
        .to_sql()
        .unwrap();
    assert_eq!(
        sql,
        "UPDATE [dbo].[Customer] SET [Email] = @Email WHERE [Id] IN (@Id_0, @Id_1)"
    );
}

#[test]
fn upsert_without_identity_value_inserts() {
    let ds = postgres();
    let cmd = ds
        .upsert("Product", Record::new().with("Name", "Lamp"))
        .unwrap();
    assert_eq!(cmd.upsert_plan().unwrap(), UpsertPlan::Insert);

    let stmt = cmd.prepare(&DesiredColumns::Auto).unwrap();
    assert_eq!(
        stmt.text,
        "INSERT INTO \"public\".\"Product\" (\"Name\") VALUES ($1) RETURNING \"Id\""
    );
    assert_eq!(stmt.row_count_check, Some(RowCountCheck::Exactly(1)));
    assert_eq!(stmt.operation, OperationKind::Upsert);
}

#[test]
fn upsert_with_identity_value_updates() {
    let ds = postgres();
    let cmd = ds
        .upsert("Product", Record::new().with("Id", 3).with("Name", "Lamp"))
        .unwrap();
    assert_eq!(cmd.upsert_plan().unwrap(), UpsertPlan::Update);
    assert_eq!(
        cmd.to_sql().unwrap(),
        "UPDATE \"public\".\"Product\" SET \"Name\" = $1 WHERE \"Id\" = $2"
    );
}

#[test]
fn upsert_with_identity_override_merges() {
    let ds = postgres();
    let cmd = ds
        .upsert("Product", Record::new().with("Id", 3).with("Name", "Lamp"))
        .unwrap()
        .identity_insert();
    assert_eq!(cmd.upsert_plan().unwrap(), UpsertPlan::Merge);

    let stmt = cmd.prepare(&DesiredColumns::NoColumns).unwrap();
    assert_eq!(
        stmt.text,
        "INSERT INTO \"public\".\"Product\" (\"Id\", \"Name\") OVERRIDING SYSTEM VALUE VALUES ($1, $2) \
         ON CONFLICT (\"Id\") DO UPDATE SET \"Name\" = EXCLUDED.\"Name\""
    );
    assert_eq!(stmt.row_count_check, Some(RowCountCheck::AtLeast(1)));
}

#[test]
fn natural_key_upsert_merges() {
    let ds = postgres();
    let stmt = ds
        .upsert(
            "Setting",
            Record::new().with("Key", "theme").with("Value", "dark"),
        )
        .unwrap()
        .prepare(&DesiredColumns::NoColumns)
        .unwrap();
    assert_eq!(
        stmt.text,
        "INSERT INTO \"public\".\"Setting\" (\"Key\", \"Value\") VALUES ($1, $2) \
         ON CONFLICT (\"Key\") DO UPDATE SET \"Value\" = EXCLUDED.\"Value\""
    );
    assert_eq!(stmt.row_count_check, Some(RowCountCheck::AtLeast(1)));
}

#[test]
fn upsert_with_only_keys_skips_the_row_check() {
    let ds = postgres();
    let stmt = ds
        .upsert("Setting", Record::new().with("Key", "theme"))
        .unwrap()
        .prepare(&DesiredColumns::NoColumns)
        .unwrap();
    assert_eq!(stmt.row_count_check, None);
}

#[test]
fn natural_key_upsert_needs_the_key_value() {
    let ds = postgres();
    for row in [
        Record::new().with("Value", "dark"),
        Record::new().with("Key", Value::Null).with("Value", "dark"),
    ] {
        let err = ds.upsert("Setting", row).unwrap().to_sql().unwrap_err();
        assert!(matches!(
            err,
            TabulaError::Mapping(MappingError::MissingKeyValue { ref column, .. }) if column == "Key"
        ));
    }

    let snapshot = SchemaSnapshot::new().table(
        TableDef::table("dbo.Setting")
            .column(ColumnDef::new("Code", "nvarchar").primary_key())
            .column(ColumnDef::new("Value", "nvarchar").nullable()),
    );
    let cache = SchemaCache::new(Arc::new(SqlServerDialect), Arc::new(snapshot));
    let ds = DataSource::new(Arc::new(cache));
    let err = ds
        .upsert("Setting", Record::new().with("Value", "x"))
        .unwrap()
        .to_sql()
        .unwrap_err();
    assert!(matches!(
        err,
        TabulaError::Mapping(MappingError::MissingKeyValue { ref column, .. }) if column == "Code"
    ));
}

#[test]
fn strict_mapping_rejects_missing_required_columns() {
    let ds = sql_server();
    let err = ds
        .insert("Customer", Record::new().with("Email", "a@b.com"))
        .unwrap()
        .strict_mapping()
        .to_sql()
        .unwrap_err();
    assert!(matches!(
        err,
        TabulaError::Mapping(MappingError::ColumnNotMapped { ref column, .. }) if column == "Name"
    ));
}

#[test]
fn unknown_tables_are_not_found() {
    let ds = sql_server();
    let err = ds.insert("Nope", Record::new().with("A", 1)).unwrap_err();
    assert!(err.is_not_found());
}
