//! Deterministic embedder for tests

use async_trait::async_trait;
use llego_common::{LlegoError, Result};
use llego_embedding::{Embedding, EmbeddingClient, TaskType};
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Embedder returning fixed vectors for known texts and hashed vectors otherwise
pub struct FakeEmbedder {
    dimension: usize,
    vectors: HashMap<String, Vec<f32>>,
    failing: HashSet<String>,
    available: AtomicBool,
    delay_ms: AtomicU64,
    calls: AtomicUsize,
    task_types: Mutex<Vec<TaskType>>,
}

impl FakeEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: HashMap::new(),
            failing: HashSet::new(),
            available: AtomicBool::new(true),
            delay_ms: AtomicU64::new(0),
            calls: AtomicUsize::new(0),
            task_types: Mutex::new(Vec::new()),
        }
    }

    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    /// Make embedding `text` fail with a provider error
    pub fn fail_on(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Latency added to every `embed` call
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn task_types(&self) -> Vec<TaskType> {
        self.task_types.lock().map(|t| t.clone()).unwrap_or_default()
    }

    fn hashed(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let seed = hasher.finish();
        (0..self.dimension)
            .map(|i| ((seed.rotate_left(i as u32) % 97) as f32 + 1.0) / 98.0)
            .collect()
    }
}

#[async_trait]
impl EmbeddingClient for FakeEmbedder {
    async fn embed(&self, text: &str, task_type: TaskType) -> Result<Embedding> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.task_types.lock() {
            seen.push(task_type);
        }

        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if !self.available.load(Ordering::SeqCst) {
            return Err(LlegoError::embedding_service("Fake embedder is offline"));
        }
        if text.trim().is_empty() {
            return Err(LlegoError::invalid_input("Text to embed cannot be empty"));
        }
        if self.failing.contains(text) {
            return Err(LlegoError::embedding_service(format!("Refused to embed '{}'", text)));
        }

        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.hashed(text)))
    }

    async fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(LlegoError::embedding_service("Fake embedder is offline"))
        }
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model(&self) -> &str {
        "fake-embedding"
    }
}
