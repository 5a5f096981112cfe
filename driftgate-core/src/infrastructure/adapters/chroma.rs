// driftgate-core/src/infrastructure/adapters/chroma.rs
//
// Read-only access to a Chroma persistent directory. Chroma keeps its
// catalog and the embeddings write-ahead log in `chroma.sqlite3`; the live
// set of vectors is obtained by replaying that log for one collection.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::GateError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::vector_store::VectorStore;

pub const CHROMA_DB_FILE: &str = "chroma.sqlite3";

/// Operation codes of the embeddings queue.
mod op {
    pub const ADD: i64 = 0;
    pub const UPDATE: i64 = 1;
    pub const UPSERT: i64 = 2;
    pub const DELETE: i64 = 3;
}

#[derive(Debug, Clone)]
pub struct ChromaStore {
    pool: SqlitePool,
    location: String,
}

impl ChromaStore {
    pub async fn open(persist_dir: &Path, timeout: Duration) -> Result<Self, InfrastructureError> {
        let location = persist_dir.display().to_string();
        let unavailable = |reason: String| InfrastructureError::SourceUnavailable {
            source_name: location.clone(),
            reason,
        };

        let db_path = persist_dir.join(CHROMA_DB_FILE);
        if !db_path.is_file() {
            return Err(unavailable(format!("{} not found", db_path.display())));
        }

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(timeout)
            .connect_with(options)
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        Ok(Self { pool, location })
    }

    async fn collection_id(&self, collection: &str) -> Result<String, GateError> {
        let row = sqlx::query("SELECT id FROM collections WHERE name = ?")
            .bind(collection)
            .fetch_optional(&self.pool)
            .await
            .map_err(InfrastructureError::from)?;

        match row {
            Some(row) => Ok(row.try_get::<String, _>("id").map_err(InfrastructureError::from)?),
            None => Err(InfrastructureError::TargetNotFound {
                target: collection.to_string(),
                source_name: self.location.clone(),
            }
            .into()),
        }
    }

    /// Live ids already folded into the collection's segments, or `None` when
    /// the store has no segment tables.
    async fn indexed_count(&self, collection_id: &str) -> Result<Option<u64>, GateError> {
        let tables: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('segments', 'embeddings')",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(InfrastructureError::from)?;
        if tables < 2 {
            return Ok(None);
        }

        let count: i64 = sqlx::query_scalar(
            "SELECT count(DISTINCT e.embedding_id) FROM embeddings e \
             JOIN segments s ON e.segment_id = s.id WHERE s.collection = ?",
        )
        .bind(collection_id)
        .fetch_one(&self.pool)
        .await
        .map_err(InfrastructureError::from)?;
        Ok(Some(count.max(0) as u64))
    }
}

#[async_trait]
impl VectorStore for ChromaStore {
    #[instrument(skip(self), fields(store = %self.location))]
    async fn fetch_embeddings(&self, collection: &str) -> Result<Vec<Vec<f32>>, GateError> {
        let collection_id = self.collection_id(collection).await?;

        // Topics look like `persistent://<tenant>/<database>/<collection id>`
        let rows = sqlx::query(
            "SELECT operation, id, vector, encoding FROM embeddings_queue \
             WHERE topic LIKE ? ORDER BY seq_id",
        )
        .bind(format!("%/{}", collection_id))
        .fetch_all(&self.pool)
        .await
        .map_err(InfrastructureError::from)?;

        let mut live: BTreeMap<String, Vec<f32>> = BTreeMap::new();
        for row in rows {
            let operation: i64 = row.try_get("operation").map_err(InfrastructureError::from)?;
            let id: String = row.try_get("id").map_err(InfrastructureError::from)?;
            let blob: Option<Vec<u8>> = row.try_get("vector").map_err(InfrastructureError::from)?;
            let encoding: Option<String> =
                row.try_get("encoding").map_err(InfrastructureError::from)?;

            let vector = blob
                .map(|bytes| decode_vector(&bytes, encoding.as_deref()))
                .transpose()?;

            match (operation, vector) {
                (op::DELETE, _) => {
                    live.remove(&id);
                }
                (op::ADD, Some(v)) => {
                    live.entry(id).or_insert(v);
                }
                (op::UPDATE, Some(v)) => {
                    if let Some(existing) = live.get_mut(&id) {
                        *existing = v;
                    }
                }
                (op::UPSERT, Some(v)) => {
                    live.insert(id, v);
                }
                // Metadata-only writes leave the vector untouched
                _ => {}
            }
        }

        debug!(count = live.len(), "Replayed embeddings log");

        // A purged log would otherwise read as an empty collection
        if let Some(indexed) = self.indexed_count(&collection_id).await? {
            if indexed > live.len() as u64 {
                return Err(GateError::InternalError(format!(
                    "embeddings log compacted: {} live ids, {} replayed",
                    indexed,
                    live.len()
                )));
            }
        }
        Ok(live.into_values().collect())
    }

    fn location(&self) -> &str {
        &self.location
    }
}

/// Vectors are packed little-endian, 4 bytes per component.
fn decode_vector(bytes: &[u8], encoding: Option<&str>) -> Result<Vec<f32>, GateError> {
    if bytes.len() % 4 != 0 {
        return Err(GateError::InternalError(format!(
            "Vector blob of {} bytes is not a multiple of 4",
            bytes.len()
        )));
    }

    let words = bytes.chunks_exact(4).map(|c| [c[0], c[1], c[2], c[3]]);
    match encoding.map(str::to_ascii_uppercase).as_deref() {
        None | Some("FLOAT32") => Ok(words.map(f32::from_le_bytes).collect()),
        Some("INT32") => Ok(words.map(|w| i32::from_le_bytes(w) as f32).collect()),
        Some(other) => Err(GateError::InternalError(format!(
            "Unsupported vector encoding '{}'",
            other
        ))),
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_replays_log_into_live_vectors() -> Result<()> {
        let dir = tempdir()?;
        fixture::create(
            dir.path(),
            "documents",
            &[
                (op::ADD, "a", Some(vec![3.0, 4.0])),
                (op::ADD, "b", Some(vec![1.0, 0.0])),
                (op::ADD, "a", Some(vec![9.0, 9.0])), // duplicate add is ignored
                (op::UPDATE, "b", Some(vec![0.0, 2.0])),
                (op::UPSERT, "c", Some(vec![6.0, 8.0])),
                (op::ADD, "d", Some(vec![1.0, 1.0])),
                (op::DELETE, "d", None),
                (op::UPDATE, "ghost", Some(vec![1.0, 1.0])), // update of unknown id
            ],
        )
        .await?;

        let store = ChromaStore::open(dir.path(), TIMEOUT).await?;
        let vectors = store.fetch_embeddings("documents").await?;

        assert_eq!(
            vectors,
            vec![vec![3.0, 4.0], vec![0.0, 2.0], vec![6.0, 8.0]]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_collection_is_ok() -> Result<()> {
        let dir = tempdir()?;
        fixture::create(dir.path(), "documents", &[]).await?;

        let store = ChromaStore::open(dir.path(), TIMEOUT).await?;
        assert!(store.fetch_embeddings("documents").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_purged_log_is_an_error_not_an_empty_collection() -> Result<()> {
        let dir = tempdir()?;
        fixture::create(dir.path(), "documents", &[]).await?;
        fixture::index(dir.path(), "documents", &["a", "b", "c"]).await?;

        let store = ChromaStore::open(dir.path(), TIMEOUT).await?;
        let err = store.fetch_embeddings("documents").await.unwrap_err();

        assert!(matches!(err, GateError::InternalError(_)));
        assert!(err.to_string().contains("3 live ids, 0 replayed"));
        // Local to this collection, not a source failure
        assert!(!err.is_fatal());
        Ok(())
    }

    #[tokio::test]
    async fn test_indexed_ids_matching_the_log_are_fine() -> Result<()> {
        let dir = tempdir()?;
        fixture::create(
            dir.path(),
            "documents",
            &[
                (op::ADD, "a", Some(vec![3.0, 4.0])),
                (op::ADD, "b", Some(vec![1.0, 0.0])),
            ],
        )
        .await?;
        fixture::index(dir.path(), "documents", &["a", "b"]).await?;

        let store = ChromaStore::open(dir.path(), TIMEOUT).await?;
        assert_eq!(store.fetch_embeddings("documents").await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_collection_is_target_not_found() -> Result<()> {
        let dir = tempdir()?;
        fixture::create(dir.path(), "documents", &[]).await?;

        let store = ChromaStore::open(dir.path(), TIMEOUT).await?;
        let err = store.fetch_embeddings("other").await.unwrap_err();
        assert!(matches!(
            err,
            GateError::Infrastructure(InfrastructureError::TargetNotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_persist_dir_is_source_unavailable() -> Result<()> {
        let dir = tempdir()?;
        let res = ChromaStore::open(&dir.path().join("chroma_store"), TIMEOUT).await;
        assert!(matches!(
            res,
            Err(InfrastructureError::SourceUnavailable { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_decode_vector() {
        let bytes = fixture::encode(&[1.5, -2.0]);
        assert_eq!(decode_vector(&bytes, Some("FLOAT32")).unwrap(), vec![1.5, -2.0]);
        assert!(decode_vector(&bytes[..3], None).is_err());
        assert!(decode_vector(&bytes, Some("FLOAT16")).is_err());
    }
}
