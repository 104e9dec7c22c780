use async_trait::async_trait;
use llego_common::Result;

use crate::types::{Embedding, TaskType};

/// Common trait for text embedding providers
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Embed a single non-empty text
    async fn embed(&self, text: &str, task_type: TaskType) -> Result<Embedding>;

    /// Check that the provider is reachable and the model exists
    async fn check_available(&self) -> Result<()>;

    /// Dimensionality of every vector this client returns
    fn dimension(&self) -> usize;

    /// Model name used for embeddings
    fn model(&self) -> &str;
}
