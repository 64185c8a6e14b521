//! tabula-introspect
//!
//! Builds a tabula [`SchemaSnapshot`](tabula::SchemaSnapshot) from a live
//! PostgreSQL catalog.
//!
//! The snapshot can be cached into a local directory (default: `./.tabula/`)
//! so later runs skip a full catalog read when the schema fingerprint has
//! not changed.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tabula::DataSource;
//! use tabula_introspect::{SnapshotCache, SnapshotCacheConfig};
//!
//! let (client, connection) = tokio_postgres::connect(&url, NoTls).await?;
//! tokio::spawn(connection);
//!
//! let config = SnapshotCacheConfig::default().schemas(["public", "billing"]);
//! let (cache, _load) = SnapshotCache::load_or_refresh(&client, &config).await?;
//! let ds = DataSource::new(Arc::new(cache.schema_cache()));
//! ```

pub mod catalog;
pub mod client;
pub mod error;
pub mod snapshot_cache;

pub use catalog::{load_snapshot, schema_fingerprint};
pub use client::{IntrospectClient, RowExt};
pub use error::{IntrospectError, IntrospectResult};
pub use snapshot_cache::{SnapshotCache, SnapshotCacheConfig, SnapshotCacheLoad};
