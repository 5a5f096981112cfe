// driftgate-core/src/infrastructure/adapters/duckdb.rs

use async_trait::async_trait;
use duckdb::{AccessMode, Config, Connection, params};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

// Hexagonal imports
use crate::error::GateError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::warehouse::WarehouseConnector;

pub struct DuckDBWarehouse {
    conn: Arc<Mutex<Connection>>,
    location: String,
}

impl DuckDBWarehouse {
    /// Opens the warehouse read-only. Any failure here makes the whole
    /// source unavailable.
    pub fn open(db_path: &Path) -> Result<Self, InfrastructureError> {
        let location = db_path.display().to_string();
        let unavailable = |reason: String| InfrastructureError::SourceUnavailable {
            source_name: location.clone(),
            reason,
        };

        // DuckDB would happily create a fresh empty database otherwise
        if !db_path.is_file() {
            return Err(unavailable("database file does not exist".to_string()));
        }

        let config = Config::default()
            .access_mode(AccessMode::ReadOnly)
            .map_err(|e| unavailable(e.to_string()))?;
        let conn =
            Connection::open_with_flags(db_path, config).map_err(|e| unavailable(e.to_string()))?;

        Ok(Self::from_connection(conn, location))
    }

    pub fn from_connection(conn: Connection, location: impl Into<String>) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            location: location.into(),
        }
    }

    /// DuckDB calls block; run them off the async workers so callers can
    /// bound them with a timeout.
    async fn with_connection<T, F>(&self, f: F) -> Result<T, GateError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, duckdb::Error> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| GateError::InternalError("DuckDB Mutex Poisoned".into()))?;
            f(&guard).map_err(|e| GateError::Infrastructure(e.into()))
        })
        .await
        .map_err(|e| GateError::InternalError(format!("DuckDB task failed: {}", e)))?
    }
}

/// Catalog spelling of `schema.table`, matched case-insensitively the way
/// DuckDB resolves unquoted identifiers.
fn resolve_table(
    conn: &Connection,
    schema: &str,
    table: &str,
) -> Result<Option<(String, String)>, duckdb::Error> {
    let mut stmt = conn.prepare(
        "SELECT table_schema, table_name FROM information_schema.tables \
         WHERE lower(table_schema) = lower(?) AND lower(table_name) = lower(?) \
         ORDER BY table_schema, table_name LIMIT 1",
    )?;
    let mut rows = stmt.query(params![schema, table])?;
    match rows.next()? {
        Some(row) => Ok(Some((row.get(0)?, row.get(1)?))),
        None => Ok(None),
    }
}

#[async_trait]
impl WarehouseConnector for DuckDBWarehouse {
    async fn table_exists(&self, schema: &str, table: &str) -> Result<bool, GateError> {
        let (schema, table) = (schema.to_string(), table.to_string());
        let resolved = self
            .with_connection(move |conn| resolve_table(conn, &schema, &table))
            .await?;
        Ok(resolved.is_some())
    }

    async fn count_rows(&self, schema: &str, table: &str) -> Result<u64, GateError> {
        let (schema, table) = (schema.to_string(), table.to_string());
        let count: i64 = self
            .with_connection(move |conn| {
                // Unknown tables fall through to the query and fail there
                let (schema, table) =
                    resolve_table(conn, &schema, &table)?.unwrap_or((schema, table));
                // Identifiers are validated upstream; quoting keeps the catalog spelling
                let query = format!("SELECT count(*) FROM \"{}\".\"{}\"", schema, table);
                debug!(%query, "Counting rows");
                conn.query_row(&query, [], |row| row.get(0))
            })
            .await?;

        u64::try_from(count)
            .map_err(|_| GateError::InternalError(format!("Negative row count {}", count)))
    }

    fn location(&self) -> &str {
        &self.location
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    fn seeded() -> Result<DuckDBWarehouse> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "CREATE SCHEMA main_marts;
             CREATE TABLE main_marts.orders AS SELECT range AS id FROM range(42);
             CREATE TABLE main_marts.empty_mart (id INTEGER);
             CREATE TABLE main_marts.document_index AS SELECT range AS id FROM range(3);
             CREATE TABLE main_marts.\"MonthlyRevenue\" AS SELECT range AS id FROM range(2);",
        )?;
        Ok(DuckDBWarehouse::from_connection(conn, ":memory:"))
    }

    #[tokio::test]
    async fn test_count_rows() -> Result<()> {
        let warehouse = seeded()?;
        assert_eq!(warehouse.count_rows("main_marts", "orders").await?, 42);
        assert_eq!(warehouse.count_rows("main_marts", "empty_mart").await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_table_exists() -> Result<()> {
        let warehouse = seeded()?;
        assert!(warehouse.table_exists("main_marts", "orders").await?);
        assert!(!warehouse.table_exists("main_marts", "missing").await?);
        assert!(!warehouse.table_exists("other_schema", "orders").await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_mart_names_match_case_insensitively() -> Result<()> {
        let warehouse = seeded()?;
        assert!(warehouse.table_exists("Main_Marts", "Document_Index").await?);
        assert_eq!(warehouse.count_rows("main_marts", "DOCUMENT_INDEX").await?, 3);

        // A quoted mixed-case table is found under its catalog spelling
        assert!(warehouse.table_exists("main_marts", "monthlyrevenue").await?);
        assert_eq!(warehouse.count_rows("main_marts", "monthlyrevenue").await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_counting_a_missing_table_is_a_query_error() -> Result<()> {
        let warehouse = seeded()?;
        let err = warehouse.count_rows("main_marts", "missing").await.unwrap_err();
        assert!(!err.is_fatal());
        Ok(())
    }

    #[test]
    fn test_missing_file_is_source_unavailable() -> Result<()> {
        let dir = tempdir()?;
        let res = DuckDBWarehouse::open(&dir.path().join("absent.duckdb"));
        assert!(matches!(
            res,
            Err(InfrastructureError::SourceUnavailable { .. })
        ));
        // Must not have been created as a side effect
        assert!(!dir.path().join("absent.duckdb").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_open_existing_file_read_only() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("warehouse.duckdb");
        {
            let conn = Connection::open(&path)?;
            conn.execute_batch(
                "CREATE SCHEMA main_marts;
                 CREATE TABLE main_marts.orders AS SELECT range AS id FROM range(7);",
            )?;
        }

        let warehouse = DuckDBWarehouse::open(&path)?;
        assert_eq!(warehouse.count_rows("main_marts", "orders").await?, 7);
        Ok(())
    }
}
