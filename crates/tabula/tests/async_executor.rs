use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tabula::prelude::*;
use tabula::{ColumnDef, TableDef};

fn data_source() -> DataSource {
    let snapshot = SchemaSnapshot::new().table(
        TableDef::table("Event")
            .column(ColumnDef::new("Id", "integer").primary_key().identity())
            .column(ColumnDef::new("Kind", "text"))
            .column(ColumnDef::new("Payload", "text").nullable()),
    );
    let cache = SchemaCache::new(Arc::new(SqliteDialect), Arc::new(snapshot));
    DataSource::new(Arc::new(cache))
}

/// Counts calls and answers with a fixed number of rows, or with the
/// number of two-column rows each statement carries.
struct Counting {
    calls: AtomicUsize,
    rows: Option<u64>,
}

impl Counting {
    fn fixed(rows: u64) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            rows: Some(rows),
        }
    }

    fn per_row() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            rows: None,
        }
    }
}

impl AsyncExecutor for Counting {
    async fn execute(&self, stmt: &PreparedStatement) -> TabulaResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(self.rows.unwrap_or(stmt.parameters.len() as u64 / 2))
    }
}

#[tokio::test]
async fn batch_insert_runs_every_chunk() {
    let ds = data_source();
    let rows: Vec<Record> = (0..600)
        .map(|i| Record::new().with("Kind", "click").with("Payload", format!("{{\"n\":{i}}}")))
        .collect();
    let cmd = ds.insert_batch("Event", rows).unwrap();

    let db = Counting::per_row();
    assert_eq!(cmd.execute_async(&db).await.unwrap(), 600);
    // 999 parameters / 2 per row
    assert_eq!(db.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn row_count_is_verified_after_the_await() {
    let ds = data_source();
    let cmd = ds
        .update_by_key("Event", 1, Record::new().with("Kind", "view"))
        .unwrap();

    assert_eq!(cmd.execute_async(&Counting::fixed(1)).await.unwrap(), 1);

    let err = cmd.execute_async(&Counting::fixed(0)).await.unwrap_err();
    assert!(err.is_row_count());
}

#[tokio::test]
async fn prepare_errors_skip_the_executor() {
    let ds = data_source();
    let cmd = ds.delete_set("Event").unwrap();
    let db = Counting::fixed(1);

    assert!(cmd.execute_async(&db).await.is_err());
    assert_eq!(db.calls.load(Ordering::SeqCst), 0);
}
