use llego_common::{LlegoError, Result};
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

use crate::document::{Document, DocumentStore, FieldValue, Filter};
use crate::entities::Record;

/// Typed access to one entity collection
pub struct Repository<R: Record> {
    store: Arc<dyn DocumentStore>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Clone for Repository<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _record: PhantomData,
        }
    }
}

impl<R: Record> Repository<R> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    /// Every record of the collection; a malformed document fails the call
    pub async fn get_all(&self) -> Result<Vec<R>> {
        self.store
            .find_all(R::COLLECTION)
            .await?
            .into_iter()
            .map(decode::<R>)
            .collect()
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<R>> {
        self.store
            .find_by_id(R::COLLECTION, id)
            .await?
            .map(decode::<R>)
            .transpose()
    }

    /// Records for the given ids, unordered
    ///
    /// Unknown ids are absent from the result. Documents that no longer match
    /// the entity shape are skipped as well.
    pub async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<R>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let docs = self.store.find_by_ids(R::COLLECTION, ids).await?;
        Ok(docs
            .into_iter()
            .filter_map(|doc| match decode::<R>(doc) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(collection = R::COLLECTION, "Skipping malformed document: {}", e);
                    None
                }
            })
            .collect())
    }

    /// Records whose `field` equals `value`
    pub async fn find_by(&self, field: &str, value: impl Into<FieldValue>) -> Result<Vec<R>> {
        self.store
            .find(R::COLLECTION, &Filter::eq(field, value))
            .await?
            .into_iter()
            .map(decode::<R>)
            .collect()
    }

    /// Case-insensitive substring search over the entity's text fields
    pub async fn search_text(&self, query: &str) -> Result<Vec<R>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(LlegoError::invalid_input("Search query cannot be empty"));
        }

        self.store
            .find(R::COLLECTION, &Filter::contains(R::SEARCH_FIELDS, query))
            .await?
            .into_iter()
            .map(decode::<R>)
            .collect()
    }

    /// Insert a new record, letting the store assign the id
    pub async fn insert(&self, record: &R) -> Result<String> {
        let mut document = serde_json::to_value(record)?;
        if let Some(object) = document.as_object_mut() {
            object.remove("id");
        }
        self.store.insert(R::COLLECTION, document).await
    }
}

fn decode<R: Record>(document: Document) -> Result<R> {
    let id = document
        .get("_id")
        .and_then(Value::as_str)
        .unwrap_or("<no id>")
        .to_string();

    serde_json::from_value(document).map_err(|e| {
        LlegoError::database(format!(
            "Malformed document {} in {}: {}",
            id,
            R::COLLECTION,
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Branch, Product, User};
    use crate::memory::MemoryStore;
    use chrono::Utc;
    use serde_json::json;

    fn product(id: &str, name: &str, branch: &str, available: bool) -> Value {
        json!({
            "_id": id,
            "branchId": branch,
            "name": name,
            "description": format!("{} artesanal", name),
            "price": 2.0,
            "availability": available,
            "createdAt": "2024-03-01T10:00:00Z"
        })
    }

    async fn seeded() -> (Arc<MemoryStore>, Repository<Product>) {
        let store = Arc::new(MemoryStore::new());
        store.put("products", product("p1", "Pan de gloria", "b1", true)).await.unwrap();
        store.put("products", product("p2", "Pastel de guayaba", "b1", false)).await.unwrap();
        store.put("products", product("p3", "Batido de mamey", "b2", true)).await.unwrap();
        let repo = Repository::<Product>::new(store.clone());
        (store, repo)
    }

    #[tokio::test]
    async fn test_get_by_ids_skips_unknown_and_malformed() {
        let (store, repo) = seeded().await;
        store.put("products", json!({"_id": "broken", "name": 42})).await.unwrap();

        let ids: Vec<String> = ["p3", "missing", "broken", "p1"].iter().map(|s| s.to_string()).collect();
        let mut found: Vec<String> = repo
            .get_by_ids(&ids)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        found.sort();
        assert_eq!(found, vec!["p1", "p3"]);
    }

    #[tokio::test]
    async fn test_get_all_fails_on_malformed() {
        let (store, repo) = seeded().await;
        store.put("products", json!({"_id": "broken"})).await.unwrap();
        assert!(matches!(repo.get_all().await, Err(LlegoError::Database(_))));
    }

    #[tokio::test]
    async fn test_find_by_and_search_text() {
        let (_store, repo) = seeded().await;

        assert_eq!(repo.find_by("branchId", "b1").await.unwrap().len(), 2);
        assert_eq!(repo.find_by("availability", true).await.unwrap().len(), 2);

        let hits = repo.search_text("GUAYABA").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "p2");

        // description is searched too
        assert_eq!(repo.search_text("artesanal").await.unwrap().len(), 3);
        assert!(repo.search_text("  ").await.is_err());
    }

    #[tokio::test]
    async fn test_insert_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let users = Repository::<User>::new(store);
        let user = User {
            id: String::new(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            phone: None,
            password: "$argon2id$...".to_string(),
            role: "merchant".to_string(),
            created_at: Utc::now(),
        };

        let id = users.insert(&user).await.unwrap();
        let stored = users.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.email, "ana@example.com");
        assert_eq!(users.find_by("email", "ana@example.com").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_by_id_absent() {
        let store = Arc::new(MemoryStore::new());
        let branches = Repository::<Branch>::new(store);
        assert!(branches.get_by_id("nope").await.unwrap().is_none());
    }
}
