use crate::catalog::{load_snapshot, schema_fingerprint};
use crate::client::IntrospectClient;
use crate::error::IntrospectResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabula::{PostgresDialect, SchemaCache, SchemaSnapshot};

const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone)]
pub struct SnapshotCacheConfig {
    /// Directory to store cache files (default: `./.tabula`).
    pub cache_dir: PathBuf,
    /// Cache file name inside `cache_dir` (default: `schema.json`).
    pub cache_file_name: String,
    /// Which PostgreSQL schemas to introspect (default: `["public"]`).
    /// The first one becomes the snapshot's default schema.
    pub schemas: Vec<String>,
}

impl Default for SnapshotCacheConfig {
    fn default() -> Self {
        let cache_dir = std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".tabula");

        Self {
            cache_dir,
            cache_file_name: "schema.json".to_string(),
            schemas: vec!["public".to_string()],
        }
    }
}

impl SnapshotCacheConfig {
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn cache_file_name(mut self, name: impl Into<String>) -> Self {
        self.cache_file_name = name.into();
        self
    }

    pub fn schemas<I, S>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schemas = schemas.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotCacheLoad {
    /// Loaded from the local file (fingerprint unchanged).
    CacheHit,
    /// Loaded from the database (file missing/invalid or fingerprint changed).
    Refreshed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotCache {
    pub version: u32,
    pub retrieved_at: DateTime<Utc>,
    pub schemas: Vec<String>,
    pub fingerprint: String,
    pub snapshot: SchemaSnapshot,
}

impl SnapshotCache {
    pub fn cache_path(config: &SnapshotCacheConfig) -> PathBuf {
        config.cache_dir.join(&config.cache_file_name)
    }

    /// Reuse the cached snapshot while the catalog fingerprint matches,
    /// otherwise introspect again and rewrite the file.
    pub async fn load_or_refresh<C: IntrospectClient>(
        client: &C,
        config: &SnapshotCacheConfig,
    ) -> IntrospectResult<(Self, SnapshotCacheLoad)> {
        let cache_path = Self::cache_path(config);

        match read_cache_file(&cache_path) {
            Ok(cached) if cached.is_compatible(config) => {
                let current = schema_fingerprint(client, &config.schemas).await?;
                if current == cached.fingerprint {
                    tracing::debug!(
                        target: "tabula.introspect",
                        path = %cache_path.display(),
                        "schema snapshot cache hit"
                    );
                    return Ok((cached, SnapshotCacheLoad::CacheHit));
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(
                    target: "tabula.introspect",
                    path = %cache_path.display(),
                    error = %e,
                    "schema snapshot cache unusable"
                );
            }
        }

        let (snapshot, fingerprint) = load_snapshot(client, &config.schemas).await?;
        let refreshed = SnapshotCache {
            version: CACHE_VERSION,
            retrieved_at: Utc::now(),
            schemas: config.schemas.clone(),
            fingerprint,
            snapshot,
        };

        write_cache_file(&cache_path, &refreshed)?;
        tracing::info!(
            target: "tabula.introspect",
            path = %cache_path.display(),
            "schema snapshot refreshed"
        );
        Ok((refreshed, SnapshotCacheLoad::Refreshed))
    }

    /// A PostgreSQL [`SchemaCache`] over this snapshot.
    pub fn schema_cache(&self) -> SchemaCache {
        SchemaCache::new(Arc::new(PostgresDialect), Arc::new(self.snapshot.clone()))
    }

    fn is_compatible(&self, config: &SnapshotCacheConfig) -> bool {
        self.version == CACHE_VERSION && self.schemas == config.schemas
    }
}

fn read_cache_file(path: &Path) -> IntrospectResult<SnapshotCache> {
    let data = std::fs::read(path)?;
    Ok(serde_json::from_slice::<SnapshotCache>(&data)?)
}

fn write_cache_file(path: &Path, cache: &SnapshotCache) -> IntrospectResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(cache)?;

    std::fs::write(&tmp_path, data)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
