use llego_common::{AppConfig, LlegoError, Result};
use llego_embedding::{EmbeddingClient, TaskType};
use llego_store::{DocumentStore, Record, Repository};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::entity::{EntityKind, Vectorizable};
use crate::index::VectorIndex;
use crate::types::{CollectionConfig, Distance};

/// Upper bound on results per search
pub const MAX_SEARCH_LIMIT: usize = 100;

/// Default minimum scores per entity kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchThresholds {
    pub products: f32,
    pub branches: f32,
}

impl SearchThresholds {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            products: config.product_score_threshold,
            branches: config.branch_score_threshold,
        }
    }

    pub fn for_kind(&self, kind: EntityKind) -> f32 {
        match kind {
            EntityKind::Products => self.products,
            EntityKind::Branches => self.branches,
        }
    }
}

impl Default for SearchThresholds {
    fn default() -> Self {
        Self {
            products: EntityKind::Products.default_score_threshold(),
            branches: EntityKind::Branches.default_score_threshold(),
        }
    }
}

/// Record with its similarity score
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit<R> {
    #[serde(flatten)]
    pub record: R,
    pub score: f32,
}

/// Semantic search over vectorized entities
///
/// Embeds the query, ranks points in the entity's collection and hydrates
/// the matching records from the document store in rank order.
pub struct VectorSearchService {
    embedder: Arc<dyn EmbeddingClient>,
    index: Arc<dyn VectorIndex>,
    store: Arc<dyn DocumentStore>,
    thresholds: SearchThresholds,
}

impl VectorSearchService {
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        index: Arc<dyn VectorIndex>,
        store: Arc<dyn DocumentStore>,
        thresholds: SearchThresholds,
    ) -> Self {
        Self {
            embedder,
            index,
            store,
            thresholds,
        }
    }

    /// Effective threshold: the caller's override or the entity default
    pub fn threshold_for(&self, kind: EntityKind, requested: Option<f32>) -> Result<f32> {
        match requested {
            Some(t) if !t.is_finite() => Err(LlegoError::invalid_input(
                "score_threshold must be a finite number",
            )),
            Some(t) => Ok(t),
            None => Ok(self.thresholds.for_kind(kind)),
        }
    }

    /// Records most similar to `query`, best first
    pub async fn search<R: Vectorizable>(
        &self,
        query: &str,
        limit: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<R>> {
        Ok(self
            .search_scored::<R>(query, limit, score_threshold)
            .await?
            .into_iter()
            .map(|hit| hit.record)
            .collect())
    }

    /// Same as `search`, keeping each record's score
    pub async fn search_scored<R: Vectorizable>(
        &self,
        query: &str,
        limit: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<SearchHit<R>>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(LlegoError::invalid_input("Search query cannot be empty"));
        }
        if limit == 0 {
            return Err(LlegoError::invalid_input("limit must be at least 1"));
        }
        let limit = limit.min(MAX_SEARCH_LIMIT);
        let threshold = self.threshold_for(R::KIND, score_threshold)?;
        let collection = R::KIND.collection();

        debug!(
            "Vector search in '{}': query='{}', limit={}, threshold={}",
            collection, query, limit, threshold
        );

        let vector = self
            .embedder
            .embed(query, TaskType::RetrievalQuery)
            .await
            .map_err(|e| unavailable("Embedding service", e))?;

        let hits = match self
            .index
            .search(collection, &vector, limit, Some(threshold))
            .await
        {
            Ok(hits) => hits,
            Err(LlegoError::CollectionNotFound(_)) => {
                warn!(
                    "Collection '{}' does not exist yet, creating it empty",
                    collection
                );
                let config = CollectionConfig::new(self.embedder.dimension(), Distance::Cosine);
                self.index
                    .ensure_collection(collection, &config)
                    .await
                    .map_err(|e| unavailable("Vector index", e))?;
                return Ok(Vec::new());
            }
            Err(e) => return Err(unavailable("Vector index", e)),
        };

        let mut ranked: Vec<(String, f32)> = Vec::with_capacity(hits.len());
        let mut seen = HashSet::new();
        for hit in &hits {
            match hit.record_id() {
                Some(id) if seen.insert(id.to_string()) => ranked.push((id.to_string(), hit.score)),
                Some(_) => {}
                None => warn!("Point {} in '{}' has no record id", hit.id, collection),
            }
        }

        if ranked.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = ranked.iter().map(|(id, _)| id.clone()).collect();
        let mut records: HashMap<String, R> = Repository::<R>::new(Arc::clone(&self.store))
            .get_by_ids(&ids)
            .await?
            .into_iter()
            .map(|record| (record.id().to_string(), record))
            .collect();

        let results: Vec<SearchHit<R>> = ranked
            .into_iter()
            .filter_map(|(id, score)| records.remove(&id).map(|record| SearchHit { record, score }))
            .collect();

        if results.len() < ids.len() {
            debug!(
                "{} indexed {} no longer in the store",
                ids.len() - results.len(),
                collection
            );
        }

        info!(
            "Vector search in '{}' returned {} results",
            collection,
            results.len()
        );
        Ok(results)
    }
}

/// Collapse backend outages into `SearchUnavailable`; caller errors pass through
fn unavailable(component: &str, error: LlegoError) -> LlegoError {
    match error {
        LlegoError::EmbeddingService(msg)
        | LlegoError::IndexUnavailable(msg)
        | LlegoError::SearchUnavailable(msg) => {
            LlegoError::search_unavailable(format!("{} unavailable: {}", component, msg))
        }
        other => other,
    }
}
