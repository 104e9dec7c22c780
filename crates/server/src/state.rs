use llego_embedding::EmbeddingClient;
use llego_store::{DocumentStore, Record, Repository};
use llego_vector::{BulkVectorizer, SearchThresholds, VectorIndex, VectorSearchService};
use std::sync::Arc;

use crate::auth::JwtIssuer;
use crate::job_manager::JobManager;

/// Shared application state
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,

    pub embedder: Arc<dyn EmbeddingClient>,

    pub index: Arc<dyn VectorIndex>,

    pub search: VectorSearchService,

    pub vectorizer: BulkVectorizer,

    pub jwt: JwtIssuer,

    pub job_manager: Arc<JobManager>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        embedder: Arc<dyn EmbeddingClient>,
        index: Arc<dyn VectorIndex>,
        thresholds: SearchThresholds,
        jwt: JwtIssuer,
    ) -> Self {
        let search = VectorSearchService::new(
            Arc::clone(&embedder),
            Arc::clone(&index),
            Arc::clone(&store),
            thresholds,
        );
        let vectorizer =
            BulkVectorizer::new(Arc::clone(&embedder), Arc::clone(&index), Arc::clone(&store));

        Self {
            store,
            embedder,
            index,
            search,
            vectorizer,
            jwt,
            job_manager: Arc::new(JobManager::new()),
        }
    }

    /// Typed repository over the shared store
    pub fn repo<R: Record>(&self) -> Repository<R> {
        Repository::new(Arc::clone(&self.store))
    }
}
