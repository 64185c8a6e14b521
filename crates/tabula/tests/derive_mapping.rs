#![allow(dead_code)]

use std::sync::Arc;

use tabula::prelude::*;
use tabula::{ColumnDef, FieldMapping, TableDef};

#[derive(Debug, Clone, tabula::Mapped)]
#[tabula(table = "dbo.Customer")]
struct Customer {
    #[tabula(key)]
    id: Option<i32>,
    name: String,
    #[tabula(column = "Email")]
    email_address: Option<String>,
    #[tabula(ignore_on_update)]
    created_by: String,
    #[tabula(skip)]
    dirty: bool,
}

#[derive(Debug, Clone, tabula::Mapped)]
#[tabula(rename_all = "PascalCase")]
struct OrderLine {
    #[tabula(key)]
    order_id: i64,
    #[tabula(key)]
    line_no: i32,
    #[tabula(ignore_on_insert)]
    quantity: i32,
}

#[derive(Debug, Clone, tabula::Mapped)]
struct Invoice {
    number: String,
}

fn data_source() -> DataSource {
    let snapshot = SchemaSnapshot::new()
        .table(
            TableDef::table("Customer")
                .column(ColumnDef::new("Id", "int").primary_key().identity())
                .column(ColumnDef::new("Name", "nvarchar"))
                .column(ColumnDef::new("Email", "nvarchar").nullable())
                .column(ColumnDef::new("CreatedBy", "nvarchar")),
        )
        .table(
            TableDef::table("order_lines")
                .column(ColumnDef::new("OrderId", "bigint"))
                .column(ColumnDef::new("LineNo", "int"))
                .column(ColumnDef::new("Quantity", "int").nullable()),
        );
    let cache = SchemaCache::new(Arc::new(SqlServerDialect), Arc::new(snapshot));
    DataSource::new(Arc::new(cache))
}

fn ann() -> Customer {
    Customer {
        id: None,
        name: "Ann".into(),
        email_address: Some("a@b.com".into()),
        created_by: "import".into(),
        dirty: true,
    }
}

#[test]
fn mapping_describes_the_fields() {
    let mapping = Customer::mapping();
    assert_eq!(mapping.type_name, "Customer");
    assert_eq!(mapping.table.as_deref(), Some("dbo.Customer"));

    let fields: Vec<_> = mapping.fields.iter().map(|f| f.field.as_str()).collect();
    assert_eq!(fields, ["id", "name", "email_address", "created_by"]);
    assert_eq!(
        mapping.fields[2],
        FieldMapping {
            field: "email_address".into(),
            column: Some("Email".into()),
            is_key: false,
            ignore_on_insert: false,
            ignore_on_update: false,
        }
    );
    assert_eq!(mapping.key_fields().count(), 1);
}

#[test]
fn rename_all_sets_column_names() {
    let mapping = OrderLine::mapping();
    let columns: Vec<_> = mapping
        .fields
        .iter()
        .map(|f| f.column.as_deref().unwrap())
        .collect();
    assert_eq!(columns, ["OrderId", "LineNo", "Quantity"]);
    assert_eq!(mapping.table, None);
}

#[test]
fn to_record_copies_values_and_flags() {
    let record = ann().to_record();
    assert_eq!(record.len(), 4);
    assert_eq!(record.get("id").unwrap().value, Value::Null);
    assert!(record.get("id").unwrap().is_key);

    let email = record.get("email_address").unwrap();
    assert_eq!(email.column_name(), "Email");
    assert_eq!(email.value, Value::from("a@b.com"));
    assert!(record.get("created_by").unwrap().ignore_on_update);
    assert!(record.get("dirty").is_none());
}

#[test]
fn insert_object_uses_the_declared_table() {
    let ds = data_source();
    let stmt = ds
        .insert_object(&ann())
        .unwrap()
        .prepare(&DesiredColumns::Auto)
        .unwrap();
    assert_eq!(
        stmt.text,
        "INSERT INTO [dbo].[Customer] ([Name], [Email], [CreatedBy]) OUTPUT Inserted.[Id] \
         VALUES (@Name, @Email, @CreatedBy)"
    );
}

#[test]
fn update_object_keys_on_the_key_field() {
    let ds = data_source();
    let customer = Customer {
        id: Some(5),
        ..ann()
    };
    let sql = ds.update_object(&customer).unwrap().to_sql().unwrap();
    assert_eq!(
        sql,
        "UPDATE [dbo].[Customer] SET [Name] = @Name, [Email] = @Email WHERE [Id] = @Id"
    );
}

#[test]
fn conventions_find_the_table_and_composite_keys_work() {
    let ds = data_source();
    let line = OrderLine {
        order_id: 10,
        line_no: 2,
        quantity: 3,
    };

    let sql = ds.update_object(&line).unwrap().to_sql().unwrap();
    assert_eq!(
        sql,
        "UPDATE [dbo].[order_lines] SET [Quantity] = @Quantity \
         WHERE [OrderId] = @OrderId AND [LineNo] = @LineNo"
    );

    let sql = ds.insert_object(&line).unwrap().to_sql().unwrap();
    assert_eq!(
        sql,
        "INSERT INTO [dbo].[order_lines] ([OrderId], [LineNo]) VALUES (@OrderId, @LineNo)"
    );
}

#[test]
fn batch_of_objects() {
    let ds = data_source();
    let customers = vec![ann(), ann(), ann()];
    let statements = ds
        .insert_batch_objects(&customers)
        .unwrap()
        .statements()
        .unwrap();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].parameters.len(), 9);
}

#[test]
fn registered_mappings_are_validated() {
    let ds = data_source();
    let registered: Vec<_> = tabula::registered_mappings().map(|r| r.type_name).collect();
    assert!(registered.contains(&"Customer"));
    assert!(registered.contains(&"OrderLine"));

    let failures = ds.cache().validate_registered_mappings();
    let failed: Vec<_> = failures.iter().map(|(name, _)| *name).collect();
    assert_eq!(failed, ["Invoice"]);
}
