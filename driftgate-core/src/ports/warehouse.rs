// driftgate-core/src/ports/warehouse.rs

// What the row-count gate needs from a tabular warehouse, without knowing
// which engine answers.

use crate::error::GateError;
use async_trait::async_trait;

#[async_trait]
pub trait WarehouseConnector: Send + Sync {
    async fn table_exists(&self, schema: &str, table: &str) -> Result<bool, GateError>;

    async fn count_rows(&self, schema: &str, table: &str) -> Result<u64, GateError>;

    /// Human-readable location, used in logs and error messages.
    fn location(&self) -> &str;
}
