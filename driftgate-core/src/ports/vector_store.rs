// driftgate-core/src/ports/vector_store.rs

use crate::error::GateError;
use async_trait::async_trait;

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// All live embedding vectors of a collection.
    ///
    /// An existing but empty collection is `Ok(vec![])`; an unknown one is
    /// `InfrastructureError::TargetNotFound`.
    async fn fetch_embeddings(&self, collection: &str) -> Result<Vec<Vec<f32>>, GateError>;

    fn location(&self) -> &str;
}
