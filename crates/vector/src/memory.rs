use async_trait::async_trait;
use llego_common::{LlegoError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::index::VectorIndex;
use crate::similarity;
use crate::types::{CollectionConfig, IndexPoint, Payload, ScoredPoint};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredPoint {
    vector: Vec<f32>,
    payload: Payload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Collection {
    config: CollectionConfig,
    points: HashMap<Uuid, StoredPoint>,
}

/// In-process vector index with exhaustive scoring
///
/// Optionally snapshotted to a JSON file. Collection changes are written
/// immediately; upserted points are written on `flush`.
pub struct MemoryIndex {
    collections: RwLock<HashMap<String, Collection>>,
    snapshot_path: Option<PathBuf>,
    dirty: AtomicBool,
    offline: AtomicBool,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            snapshot_path: None,
            dirty: AtomicBool::new(false),
            offline: AtomicBool::new(false),
        }
    }

    /// Index persisted at `path`, loading the previous snapshot if present
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let collections: HashMap<String, Collection> = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            serde_json::from_str(&data)?
        } else {
            HashMap::new()
        };

        info!(
            "Memory vector index loaded from {} - {} collections",
            path.display(),
            collections.len()
        );

        Ok(Self {
            collections: RwLock::new(collections),
            snapshot_path: Some(path),
            dirty: AtomicBool::new(false),
            offline: AtomicBool::new(false),
        })
    }

    /// Simulate an unreachable backend
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, AtomicOrdering::SeqCst);
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline.load(AtomicOrdering::SeqCst) {
            Err(LlegoError::index_unavailable("Memory index is offline"))
        } else {
            Ok(())
        }
    }

    async fn save(&self, collections: &HashMap<String, Collection>) -> Result<()> {
        if let Some(path) = &self.snapshot_path {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let data = serde_json::to_string(collections)?;
            tokio::fs::write(path, data).await?;
            self.dirty.store(false, AtomicOrdering::SeqCst);
        }
        Ok(())
    }
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> Result<()> {
        self.ensure_online()
    }

    async fn collection_info(&self, name: &str) -> Result<Option<CollectionConfig>> {
        self.ensure_online()?;
        Ok(self.collections.read().await.get(name).map(|c| c.config))
    }

    async fn create_collection(&self, name: &str, config: &CollectionConfig) -> Result<()> {
        self.ensure_online()?;
        if config.size == 0 {
            return Err(LlegoError::invalid_query("Vector size must be positive"));
        }

        let mut collections = self.collections.write().await;
        if collections.contains_key(name) {
            return Err(LlegoError::conflict(format!(
                "Collection '{}' already exists",
                name
            )));
        }
        collections.insert(
            name.to_string(),
            Collection {
                config: *config,
                points: HashMap::new(),
            },
        );
        self.save(&collections).await
    }

    async fn upsert(&self, collection: &str, point: IndexPoint) -> Result<()> {
        self.ensure_online()?;
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| LlegoError::collection_not_found(collection))?;

        if point.vector.len() != target.config.size {
            return Err(LlegoError::invalid_query(format!(
                "Vector dimension error: expected {}, got {}",
                target.config.size,
                point.vector.len()
            )));
        }

        target.points.insert(
            point.id,
            StoredPoint {
                vector: point.vector,
                payload: point.payload,
            },
        );
        debug!("Upserted point {} into '{}'", point.id, collection);
        self.dirty.store(true, AtomicOrdering::SeqCst);
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        if !self.dirty.load(AtomicOrdering::SeqCst) {
            return Ok(());
        }
        let collections = self.collections.read().await;
        self.save(&collections).await
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<ScoredPoint>> {
        self.ensure_online()?;
        let collections = self.collections.read().await;
        let target = collections
            .get(collection)
            .ok_or_else(|| LlegoError::collection_not_found(collection))?;

        let distance = target.config.distance;
        if vector.len() != target.config.size {
            return Err(LlegoError::invalid_query(format!(
                "Vector dimension error: expected {}, got {}",
                target.config.size,
                vector.len()
            )));
        }

        let mut results: Vec<(Uuid, f32, &Payload)> = target
            .points
            .iter()
            .map(|(id, point)| (*id, similarity::score(distance, vector, &point.vector), &point.payload))
            .filter(|(_, score, _)| score_threshold.map_or(true, |t| distance.passes(*score, t)))
            .collect();

        // Best first, ties broken by id so results are deterministic
        results.sort_by(|a, b| {
            let by_score = if distance.higher_is_better() {
                b.1.partial_cmp(&a.1)
            } else {
                a.1.partial_cmp(&b.1)
            };
            by_score.unwrap_or(Ordering::Equal).then_with(|| a.0.cmp(&b.0))
        });
        results.truncate(limit);

        Ok(results
            .into_iter()
            .map(|(id, score, payload)| ScoredPoint {
                id: id.to_string(),
                score,
                payload: payload.clone(),
            })
            .collect())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        self.ensure_online()?;
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.points.len())
            .ok_or_else(|| LlegoError::collection_not_found(collection))
    }
}
