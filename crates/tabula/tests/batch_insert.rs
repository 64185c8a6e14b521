use std::sync::{Arc, Mutex};

use tabula::prelude::*;
use tabula::{ColumnDef, MappingError, RowCountCheck, TableDef, ValidationError};

fn snapshot() -> SchemaSnapshot {
    SchemaSnapshot::new().table(
        TableDef::table("Customer")
            .column(ColumnDef::new("Id", "int").primary_key().identity())
            .column(ColumnDef::new("Name", "nvarchar"))
            .column(ColumnDef::new("Email", "nvarchar").nullable())
            .column(ColumnDef::new("City", "nvarchar").nullable()),
    )
}

fn data_source(dialect: Arc<dyn tabula::Dialect>) -> DataSource {
    DataSource::new(Arc::new(SchemaCache::new(dialect, Arc::new(snapshot()))))
}

fn rows(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            Record::new()
                .with("Name", format!("customer {i}"))
                .with("Email", format!("c{i}@example.com"))
                .with("City", "Oslo")
        })
        .collect()
}

/// Reports every statement as having inserted all of its rows.
#[derive(Default)]
struct InsertAll {
    batches: Mutex<Vec<usize>>,
}

impl Executor for InsertAll {
    fn execute(&self, stmt: &PreparedStatement) -> TabulaResult<u64> {
        let rows = stmt.parameters.len() / 3;
        self.batches.lock().unwrap().push(rows);
        Ok(rows as u64)
    }
}

#[test]
fn sql_server_splits_on_the_parameter_limit() {
    let ds = data_source(Arc::new(SqlServerDialect));
    let cmd = ds.insert_batch("Customer", rows(2500)).unwrap();
    assert_eq!(cmd.len(), 2500);

    let statements = cmd.statements().unwrap();
    let checks: Vec<_> = statements.iter().map(|s| s.row_count_check).collect();
    assert_eq!(
        checks,
        [
            Some(RowCountCheck::Exactly(700)),
            Some(RowCountCheck::Exactly(700)),
            Some(RowCountCheck::Exactly(700)),
            Some(RowCountCheck::Exactly(400)),
        ]
    );
    assert!(statements[0].text.starts_with(
        "INSERT INTO [dbo].[Customer] ([Name], [Email], [City]) VALUES (@Name_0, @Email_0, @City_0), (@Name_1, "
    ));
    assert!(statements.iter().all(|s| s.parameters.len() <= 2100));

    let db = InsertAll::default();
    assert_eq!(cmd.execute(&db).unwrap(), 2500);
    assert_eq!(*db.batches.lock().unwrap(), [700, 700, 700, 400]);
}

#[test]
fn parameter_numbering_restarts_per_statement() {
    let ds = data_source(Arc::new(SqlServerDialect));
    let statements = ds
        .insert_batch("Customer", rows(701))
        .unwrap()
        .statements()
        .unwrap();
    assert_eq!(statements.len(), 2);
    assert_eq!(
        statements[1].text,
        "INSERT INTO [dbo].[Customer] ([Name], [Email], [City]) VALUES (@Name_0, @Email_0, @City_0)"
    );
    assert_eq!(statements[1].parameters[0].value, Value::from("customer 700"));
}

#[test]
fn postgres_fits_in_one_statement() {
    let ds = data_source(Arc::new(PostgresDialect));
    let statements = ds
        .insert_batch("Customer", rows(2500))
        .unwrap()
        .statements()
        .unwrap();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].parameters.len(), 7500);
    assert!(statements[0].text.ends_with("($7498, $7499, $7500)"));
}

#[test]
fn configured_row_cap_applies() {
    let ds = data_source(Arc::new(MySqlDialect))
        .with_config(EngineConfig::new().with_max_rows_per_batch(1000));
    let statements = ds
        .insert_batch("Customer", rows(2500))
        .unwrap()
        .statements()
        .unwrap();
    let sizes: Vec<_> = statements.iter().map(|s| s.parameters.len() / 3).collect();
    assert_eq!(sizes, [1000, 1000, 500]);
}

#[test]
fn rows_wider_than_the_limit_are_rejected() {
    let ds = data_source(Arc::new(SqliteDialect))
        .with_config(EngineConfig::new().with_max_parameters(2));
    let err = ds
        .insert_batch("Customer", rows(3))
        .unwrap()
        .statements()
        .unwrap_err();
    assert!(matches!(
        err,
        TabulaError::Validation(ValidationError::RowTooWide {
            params_per_row: 3,
            max_parameters: 2,
            ..
        })
    ));
}

#[test]
fn rows_must_share_one_column_set() {
    let ds = data_source(Arc::new(SqlServerDialect));
    let mut batch = rows(3);
    batch[1] = Record::new().with("Name", "short row");
    let err = ds
        .insert_batch("Customer", batch)
        .unwrap()
        .statements()
        .unwrap_err();
    assert!(matches!(
        err,
        TabulaError::Mapping(MappingError::InconsistentBatchRow { row: 1, .. })
    ));
}

#[test]
fn empty_batch_runs_nothing() {
    let ds = data_source(Arc::new(SqlServerDialect));
    let cmd = ds.insert_batch("Customer", Vec::new()).unwrap();
    assert!(cmd.is_empty());
    assert!(cmd.statements().unwrap().is_empty());

    let db = InsertAll::default();
    assert_eq!(cmd.execute(&db).unwrap(), 0);
    assert!(db.batches.lock().unwrap().is_empty());
}

#[test]
fn short_batches_fail_the_row_check() {
    struct InsertsNothing;
    impl Executor for InsertsNothing {
        fn execute(&self, _stmt: &PreparedStatement) -> TabulaResult<u64> {
            Ok(0)
        }
    }

    let ds = data_source(Arc::new(SqlServerDialect));
    let cmd = ds.insert_batch("Customer", rows(10)).unwrap();
    assert!(cmd.execute(&InsertsNothing).unwrap_err().is_row_count());
    assert_eq!(cmd.ignore_rows_affected().execute(&InsertsNothing).unwrap(), 0);
}
