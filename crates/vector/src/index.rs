use async_trait::async_trait;
use llego_common::{LlegoError, Result};
use tracing::{debug, info};

use crate::types::{CollectionConfig, EnsureOutcome, IndexPoint, ScoredPoint};

/// Vector index backend (Qdrant in production, in-memory for development)
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Backend name for logs and health output
    fn backend(&self) -> &'static str;

    async fn health_check(&self) -> Result<()>;

    /// Vector parameters of `name`, or `None` when the collection is absent
    async fn collection_info(&self, name: &str) -> Result<Option<CollectionConfig>>;

    /// Create a collection; fails with `Conflict` when it already exists
    async fn create_collection(&self, name: &str, config: &CollectionConfig) -> Result<()>;

    /// Insert or overwrite a point by id
    async fn upsert(&self, collection: &str, point: IndexPoint) -> Result<()>;

    /// Nearest points, best first
    ///
    /// With a threshold, hits that do not pass it under the collection's
    /// metric are dropped.
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<ScoredPoint>>;

    async fn count(&self, collection: &str) -> Result<usize>;

    /// Persist buffered writes; a no-op for backends that write through
    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.collection_info(name).await?.is_some())
    }

    /// Create `name` unless it already exists with the same parameters
    ///
    /// Losing a creation race to a concurrent caller counts as success as
    /// long as the winner used the same parameters.
    async fn ensure_collection(
        &self,
        name: &str,
        config: &CollectionConfig,
    ) -> Result<EnsureOutcome> {
        if let Some(existing) = self.collection_info(name).await? {
            check_compatible(name, &existing, config)?;
            debug!("Collection '{}' already exists", name);
            return Ok(EnsureOutcome::AlreadyExists);
        }

        match self.create_collection(name, config).await {
            Ok(()) => {
                info!(
                    "Created collection '{}' (size={}, distance={})",
                    name, config.size, config.distance
                );
                Ok(EnsureOutcome::Created)
            }
            Err(LlegoError::Conflict(_)) => match self.collection_info(name).await? {
                Some(existing) => {
                    check_compatible(name, &existing, config)?;
                    debug!("Collection '{}' was created concurrently", name);
                    Ok(EnsureOutcome::AlreadyExists)
                }
                None => Err(LlegoError::index_unavailable(format!(
                    "Collection '{}' reported as existing but cannot be read",
                    name
                ))),
            },
            Err(e) => Err(e),
        }
    }
}

fn check_compatible(name: &str, existing: &CollectionConfig, wanted: &CollectionConfig) -> Result<()> {
    if existing == wanted {
        Ok(())
    } else {
        Err(LlegoError::invalid_query(format!(
            "Collection '{}' exists with size={} distance={}, requested size={} distance={}",
            name, existing.size, existing.distance, wanted.size, wanted.distance
        )))
    }
}
