use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tabula::prelude::*;
use tabula::{PostgresDialect, RoutineKind};
use tabula_introspect::{
    IntrospectResult, SnapshotCache, SnapshotCacheConfig, SnapshotCacheLoad, load_snapshot,
};
use tokio_postgres::NoTls;

fn unique_schema() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before UNIX_EPOCH")
        .as_nanos();
    format!("tabula_it_{}_{}", std::process::id(), nanos)
}

async fn create_fixture(client: &tokio_postgres::Client, schema: &str) -> IntrospectResult<()> {
    client
        .batch_execute(&format!(
            r#"
CREATE SCHEMA {schema};
CREATE TABLE {schema}.customer (
  id bigint GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
  name varchar(100) NOT NULL,
  email text,
  balance numeric(12, 2) NOT NULL DEFAULT 0,
  name_upper text GENERATED ALWAYS AS (upper(name)) STORED
);
CREATE UNIQUE INDEX customer_email_key ON {schema}.customer (email) INCLUDE (name);
CREATE TABLE {schema}.orders (
  id serial PRIMARY KEY,
  customer_id bigint NOT NULL REFERENCES {schema}.customer (id)
);
CREATE VIEW {schema}.rich_customer AS
  SELECT id, name FROM {schema}.customer WHERE balance > 1000;
CREATE FUNCTION {schema}.customers_named(p_name text)
  RETURNS TABLE (id bigint, name varchar)
  LANGUAGE sql AS $$ SELECT id, name FROM {schema}.customer WHERE name = p_name $$;
CREATE FUNCTION {schema}.customer_count() RETURNS bigint
  LANGUAGE sql AS $$ SELECT count(*) FROM {schema}.customer $$;
CREATE PROCEDURE {schema}.touch(IN p_id bigint, INOUT p_touched boolean)
  LANGUAGE plpgsql AS $$ BEGIN p_touched := true; END $$;
"#
        ))
        .await?;
    Ok(())
}

#[tokio::test]
async fn introspects_and_caches_a_schema() -> IntrospectResult<()> {
    let _ = dotenvy::dotenv();
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(v) => v,
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping introspects_and_caches_a_schema");
            return Ok(());
        }
    };

    let (client, connection) = tokio_postgres::connect(&database_url, NoTls).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("connection error: {e}");
        }
    });

    let schema = unique_schema();
    create_fixture(&client, &schema).await?;

    let result = check_schema(&client, &schema).await;
    client
        .batch_execute(&format!("DROP SCHEMA {schema} CASCADE"))
        .await?;
    result
}

async fn check_schema(client: &tokio_postgres::Client, schema: &str) -> IntrospectResult<()> {
    let (snapshot, fingerprint) = load_snapshot(client, &[schema.to_string()]).await?;
    assert_eq!(snapshot.default_schema.as_deref(), Some(schema));
    assert_eq!(fingerprint.len(), 32);

    let cache = SchemaCache::new(Arc::new(PostgresDialect), Arc::new(snapshot));

    let customer = cache.get_table_or_view(&format!("{schema}.customer"))?;
    assert!(customer.is_table());
    let keys: Vec<_> = customer.primary_key_columns().map(|c| c.name.as_str()).collect();
    assert_eq!(keys, ["id"]);

    let id = customer.column("id").unwrap();
    assert!(id.is_identity);
    let name = customer.column("name").unwrap();
    assert_eq!(name.max_length, Some(100));
    assert!(!name.is_nullable);
    let balance = customer.column("balance").unwrap();
    assert_eq!((balance.precision, balance.scale), (Some(12), Some(2)));
    assert!(customer.column("name_upper").unwrap().is_computed);

    let indexes = cache.get_indexes(&format!("{schema}.customer"))?;
    let email_index = indexes.iter().find(|i| i.name == "customer_email_key").unwrap();
    assert!(email_index.is_unique);
    let key_columns: Vec<_> = email_index.key_columns().map(|c| c.name.as_str()).collect();
    assert_eq!(key_columns, ["email"]);

    let orders = cache.get_table_or_view(&format!("{schema}.orders"))?;
    assert!(orders.column("id").unwrap().is_identity);
    let fks = cache.get_foreign_keys(&format!("{schema}.orders"))?;
    assert_eq!(fks.len(), 1);
    assert_eq!(fks[0].parent_table().name(), "customer");
    assert_eq!(fks[0].child_columns(), ["customer_id"]);

    let view = cache.get_table_or_view(&format!("{schema}.rich_customer"))?;
    assert!(view.is_view());
    assert_eq!(view.base_table().map(|t| t.name()), Some("customer"));

    let function = cache.get_table_function(&format!("{schema}.customers_named"))?;
    assert_eq!(function.kind(), RoutineKind::TableFunction);
    assert_eq!(function.parameters().len(), 1);
    let columns: Vec<_> = function.columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(columns, ["id", "name"]);

    let count = cache.get_scalar_function(&format!("{schema}.customer_count"))?;
    assert_eq!(count.return_type(), Some("int8"));

    let touch = cache.get_stored_procedure(&format!("{schema}.touch"))?;
    assert_eq!(touch.parameters().len(), 2);
    assert!(touch.parameter("p_touched").unwrap().direction.is_output());

    // Statements built from the introspected catalog run against it.
    let ds = DataSource::new(Arc::new(cache));
    let inserted = ds
        .insert(
            &format!("{schema}.customer"),
            Record::new().with("name", "Ada").with("email", "ada@example.com"),
        )?
        .execute_async(client)
        .await?;
    assert_eq!(inserted, 1);

    let dir = std::env::temp_dir().join(format!("tabula_it_cache_{}", std::process::id()));
    let config = SnapshotCacheConfig::default()
        .cache_dir(&dir)
        .schemas([schema]);
    let (first, load) = SnapshotCache::load_or_refresh(client, &config).await?;
    assert_eq!(load, SnapshotCacheLoad::Refreshed);
    let (second, load) = SnapshotCache::load_or_refresh(client, &config).await?;
    assert_eq!(load, SnapshotCacheLoad::CacheHit);
    assert_eq!(first.fingerprint, second.fingerprint);

    client
        .batch_execute(&format!("ALTER TABLE {schema}.orders ADD COLUMN note text"))
        .await?;
    let (third, load) = SnapshotCache::load_or_refresh(client, &config).await?;
    assert_eq!(load, SnapshotCacheLoad::Refreshed);
    assert_ne!(third.fingerprint, first.fingerprint);

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}
