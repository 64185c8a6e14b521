//! The minimal query surface introspection needs.

use crate::error::{IntrospectError, IntrospectResult};
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, ToSql};

/// A type that can run catalog queries.
///
/// Implemented for `tokio_postgres::Client` and `tokio_postgres::Transaction`.
#[async_trait::async_trait]
pub trait IntrospectClient: Sync {
    /// Execute a query and return all rows.
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> IntrospectResult<Vec<Row>>;

    /// Execute a query and return exactly one row.
    async fn query_one(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> IntrospectResult<Row>;
}

#[async_trait::async_trait]
impl IntrospectClient for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> IntrospectResult<Vec<Row>> {
        tokio_postgres::Client::query(self, sql, params)
            .await
            .map_err(IntrospectError::from)
    }

    async fn query_one(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> IntrospectResult<Row> {
        tokio_postgres::Client::query_one(self, sql, params)
            .await
            .map_err(IntrospectError::from)
    }
}

#[async_trait::async_trait]
impl IntrospectClient for tokio_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> IntrospectResult<Vec<Row>> {
        tokio_postgres::Transaction::query(self, sql, params)
            .await
            .map_err(IntrospectError::from)
    }

    async fn query_one(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> IntrospectResult<Row> {
        tokio_postgres::Transaction::query_one(self, sql, params)
            .await
            .map_err(IntrospectError::from)
    }
}

/// Column access that reports the column name on failure.
pub trait RowExt {
    fn try_get_column<'a, T>(&'a self, column: &str) -> IntrospectResult<T>
    where
        T: FromSql<'a>;
}

impl RowExt for Row {
    fn try_get_column<'a, T>(&'a self, column: &str) -> IntrospectResult<T>
    where
        T: FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| IntrospectError::decode(column, e.to_string()))
    }
}
