// driftgate-core/src/application/collector.rs

use async_trait::async_trait;
use tracing::{instrument, warn};

use crate::domain::snapshot::MetricSnapshot;
use crate::error::GateError;
use crate::ports::vector_store::VectorStore;
use crate::ports::warehouse::WarehouseConnector;

/// Produces the current snapshot of one metric key from an external source.
#[async_trait]
pub trait MetricCollector: Send + Sync {
    async fn collect(&self, metric_key: &str) -> Result<MetricSnapshot, GateError>;

    fn source_name(&self) -> &str;
}

/// L2-norm distribution of a vector collection.
pub struct VectorNormCollector<'a> {
    store: &'a dyn VectorStore,
}

impl<'a> VectorNormCollector<'a> {
    pub fn new(store: &'a dyn VectorStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl MetricCollector for VectorNormCollector<'_> {
    #[instrument(skip(self))]
    async fn collect(&self, metric_key: &str) -> Result<MetricSnapshot, GateError> {
        let vectors = self.store.fetch_embeddings(metric_key).await?;
        if vectors.is_empty() {
            warn!(collection = metric_key, "Collection is empty");
            println!("⚠️  No embeddings found in collection '{}'", metric_key);
        }
        Ok(MetricSnapshot::from_vectors(metric_key, &vectors))
    }

    fn source_name(&self) -> &str {
        self.store.location()
    }
}

/// Row count of a mart in a given warehouse schema.
pub struct RowCountCollector<'a> {
    warehouse: &'a dyn WarehouseConnector,
    schema: String,
}

impl<'a> RowCountCollector<'a> {
    pub fn new(warehouse: &'a dyn WarehouseConnector, schema: impl Into<String>) -> Self {
        Self {
            warehouse,
            schema: schema.into(),
        }
    }
}

#[async_trait]
impl MetricCollector for RowCountCollector<'_> {
    /// A missing mart counts as zero rows for that mart only.
    #[instrument(skip(self), fields(schema = %self.schema))]
    async fn collect(&self, metric_key: &str) -> Result<MetricSnapshot, GateError> {
        if !self.warehouse.table_exists(&self.schema, metric_key).await? {
            warn!(mart = metric_key, "Mart not found, counting as empty");
            println!(
                "⚠️  Mart '{}.{}' not found in {}",
                self.schema,
                metric_key,
                self.warehouse.location()
            );
            return Ok(MetricSnapshot::row_count(metric_key, 0));
        }

        let count = self.warehouse.count_rows(&self.schema, metric_key).await?;
        Ok(MetricSnapshot::row_count(metric_key, count))
    }

    fn source_name(&self) -> &str {
        self.warehouse.location()
    }
}
