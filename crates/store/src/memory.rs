use async_trait::async_trait;
use llego_common::{LlegoError, Result};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::document::{Document, DocumentStore, Filter};

/// In-process document store
///
/// Collections keep insertion order. Used by tests and local development.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document keyed by its `_id`
    pub async fn put(&self, collection: &str, document: Document) -> Result<()> {
        let id = document_id(&document)
            .ok_or_else(|| LlegoError::invalid_input("Document must carry a string _id"))?
            .to_string();

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|d| document_id(d) == Some(id.as_str())) {
            Some(existing) => *existing = document,
            None => docs.push(document),
        }
        Ok(())
    }

    /// Remove a document, returning whether it existed
    pub async fn remove(&self, collection: &str, id: &str) -> bool {
        let mut collections = self.collections.write().await;
        match collections.get_mut(collection) {
            Some(docs) => {
                let before = docs.len();
                docs.retain(|d| document_id(d) != Some(id));
                docs.len() != before
            }
            None => false,
        }
    }

    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

fn document_id(document: &Document) -> Option<&str> {
    document.get("_id").and_then(Value::as_str)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| document_id(d) == Some(id)))
            .cloned())
    }

    async fn find_by_ids(&self, collection: &str, ids: &[String]) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| document_id(d).map_or(false, |id| ids.iter().any(|i| i == id)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(&self, collection: &str, mut document: Document) -> Result<String> {
        let object = document
            .as_object_mut()
            .ok_or_else(|| LlegoError::invalid_input("Document must be a JSON object"))?;

        let id = match object.get("_id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().simple().to_string();
                object.insert("_id".to_string(), Value::String(id.clone()));
                id
            }
        };

        if self.find_by_id(collection, &id).await?.is_some() {
            return Err(LlegoError::conflict(format!("Duplicate _id {} in {}", id, collection)));
        }

        self.put(collection, document).await?;
        Ok(id)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
