use chrono::{DateTime, Utc};
use llego_common::{LlegoError, Result};
use llego_embedding::{EmbeddingClient, TaskType};
use llego_store::{Branch, DocumentStore, Product, Record, Repository};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::entity::{EntityKind, Vectorizable};
use crate::index::VectorIndex;
use crate::types::{CollectionConfig, Distance, IndexPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Success,
    PartialSuccess,
    Failed,
}

/// Step at which a record failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStage {
    Embedding,
    Upsert,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemError {
    pub record_id: String,
    pub name: String,
    pub stage: ItemStage,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedItem {
    pub record_id: String,
    pub name: String,
    pub reason: String,
}

/// Outcome of one bulk vectorization run
#[derive(Debug, Clone, Serialize)]
pub struct VectorizationReport {
    pub entity: EntityKind,
    pub collection: String,
    pub status: JobStatus,
    pub message: String,
    pub total: usize,
    pub vectorized_count: usize,
    pub skipped: Vec<SkippedItem>,
    pub errors: Vec<ItemError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl VectorizationReport {
    fn finish(mut self) -> Self {
        self.status = if self.total == 0 {
            JobStatus::Success
        } else if self.vectorized_count == 0 {
            JobStatus::Failed
        } else if self.errors.is_empty() && self.skipped.is_empty() {
            JobStatus::Success
        } else {
            JobStatus::PartialSuccess
        };

        self.message = if self.total == 0 {
            format!("No {} found to vectorize", self.entity)
        } else {
            format!(
                "Vectorized {}/{} {} ({} skipped, {} errors)",
                self.vectorized_count,
                self.total,
                self.entity,
                self.skipped.len(),
                self.errors.len()
            )
        };
        self.finished_at = Utc::now();
        self
    }
}

/// Embeds every record of an entity kind into its vector collection
pub struct BulkVectorizer {
    embedder: Arc<dyn EmbeddingClient>,
    index: Arc<dyn VectorIndex>,
    store: Arc<dyn DocumentStore>,
}

impl BulkVectorizer {
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        index: Arc<dyn VectorIndex>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            embedder,
            index,
            store,
        }
    }

    pub async fn vectorize(&self, kind: EntityKind) -> Result<VectorizationReport> {
        match kind {
            EntityKind::Products => self.vectorize_all::<Product>().await,
            EntityKind::Branches => self.vectorize_all::<Branch>().await,
        }
    }

    /// Re-embed every record of `R`
    ///
    /// Job-level failures (store unreadable, embedder unreachable, collection
    /// unusable) abort with an error before any record is touched. Per-record
    /// failures are collected in the report and the run continues.
    pub async fn vectorize_all<R: Vectorizable>(&self) -> Result<VectorizationReport> {
        let kind = R::KIND;
        let collection = kind.collection();
        let started_at = Utc::now();

        let records = Repository::<R>::new(Arc::clone(&self.store))
            .get_all()
            .await?;

        let mut report = VectorizationReport {
            entity: kind,
            collection: collection.to_string(),
            status: JobStatus::Success,
            message: String::new(),
            total: records.len(),
            vectorized_count: 0,
            skipped: Vec::new(),
            errors: Vec::new(),
            started_at,
            finished_at: started_at,
        };

        if records.is_empty() {
            info!("No {} found to vectorize", kind);
            return Ok(report.finish());
        }

        info!("Starting vectorization of {} {}", records.len(), kind);

        self.embedder.check_available().await.map_err(|e| {
            LlegoError::embedding_service(format!("Embedding service not available: {}", e))
        })?;

        let config = CollectionConfig::new(self.embedder.dimension(), Distance::Cosine);
        self.index.ensure_collection(collection, &config).await?;

        for record in &records {
            let text = record.embedding_text();
            if text.trim().is_empty() {
                warn!("Skipping {} {}: no text to embed", kind, record.id());
                report.skipped.push(SkippedItem {
                    record_id: record.id().to_string(),
                    name: record.display_name().to_string(),
                    reason: "No text to embed".to_string(),
                });
                continue;
            }

            let vector = match self.embedder.embed(&text, TaskType::RetrievalDocument).await {
                Ok(vector) => vector,
                Err(e) => {
                    error!("Failed to embed {} {}: {}", kind, record.id(), e);
                    report.errors.push(item_error(record, ItemStage::Embedding, e));
                    continue;
                }
            };

            let point = IndexPoint::for_record(record.id(), vector, record.index_payload());
            match self.index.upsert(collection, point).await {
                Ok(()) => report.vectorized_count += 1,
                Err(e) => {
                    error!("Failed to index {} {}: {}", kind, record.id(), e);
                    report.errors.push(item_error(record, ItemStage::Upsert, e));
                }
            }
        }

        self.index.flush().await?;

        let report = report.finish();
        info!("{}", report.message);
        Ok(report)
    }
}

fn item_error<R: Vectorizable>(record: &R, stage: ItemStage, error: LlegoError) -> ItemError {
    ItemError {
        record_id: record.id().to_string(),
        name: record.display_name().to_string(),
        stage,
        error: error.to_string(),
    }
}
