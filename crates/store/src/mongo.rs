use async_trait::async_trait;
use futures::TryStreamExt;
use llego_common::{LlegoError, Result};
use mongodb::bson::{self, doc, oid::ObjectId, Bson};
use mongodb::{Client, Collection, Database};
use tracing::{debug, info};

use crate::document::{Document, DocumentStore, FieldValue, Filter};

/// MongoDB-backed document store
#[derive(Debug, Clone)]
pub struct MongoStore {
    client: Client,
    database: Database,
}

impl MongoStore {
    /// Connect and verify the deployment answers a ping
    pub async fn connect(url: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(url)
            .await
            .map_err(|e| LlegoError::config(format!("Invalid MongoDB connection string: {}", e)))?;

        let store = Self {
            database: client.database(database),
            client,
        };
        store.ping().await?;

        info!(database = %database, "Connected to MongoDB");
        Ok(store)
    }

    /// Close pooled connections
    pub async fn shutdown(self) {
        self.client.shutdown().await;
        info!("MongoDB connection closed");
    }

    fn collection(&self, name: &str) -> Collection<bson::Document> {
        self.database.collection(name)
    }

    async fn collect(
        &self,
        collection: &str,
        filter: bson::Document,
    ) -> Result<Vec<Document>> {
        let cursor = self
            .collection(collection)
            .find(filter, None)
            .await
            .map_err(db_error)?;

        let docs: Vec<bson::Document> = cursor.try_collect().await.map_err(db_error)?;
        debug!(collection = %collection, count = docs.len(), "Fetched documents");

        Ok(docs.into_iter().map(to_canonical).collect())
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find_all(&self, collection: &str) -> Result<Vec<Document>> {
        self.collect(collection, doc! {}).await
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let found = self
            .collection(collection)
            .find_one(doc! { "_id": id_value(id) }, None)
            .await
            .map_err(db_error)?;

        Ok(found.map(to_canonical))
    }

    async fn find_by_ids(&self, collection: &str, ids: &[String]) -> Result<Vec<Document>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Bson> = ids.iter().map(|id| id_value(id)).collect();
        self.collect(collection, doc! { "_id": { "$in": ids } }).await
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        self.collect(collection, to_bson_filter(filter)).await
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<String> {
        let mut document = bson::to_document(&document)
            .map_err(|e| LlegoError::invalid_input(format!("Document is not an object: {}", e)))?;

        // Let the server assign an ObjectId unless the caller chose an id
        if matches!(document.get("_id"), Some(Bson::Null)) {
            document.remove("_id");
        }

        let result = self
            .collection(collection)
            .insert_one(document, None)
            .await
            .map_err(db_error)?;

        Ok(match result.inserted_id {
            Bson::ObjectId(oid) => oid.to_hex(),
            Bson::String(s) => s,
            other => other.to_string(),
        })
    }

    async fn ping(&self) -> Result<()> {
        self.database
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(db_error)?;
        Ok(())
    }
}

fn db_error(e: mongodb::error::Error) -> LlegoError {
    LlegoError::database(e.to_string())
}

/// Ids that parse as ObjectId are queried as such, anything else as a plain string
fn id_value(id: &str) -> Bson {
    ObjectId::parse_str(id)
        .map(Bson::ObjectId)
        .unwrap_or_else(|_| Bson::String(id.to_string()))
}

fn to_bson_filter(filter: &Filter) -> bson::Document {
    match filter {
        Filter::Eq { field, value } => {
            let value = match value {
                FieldValue::Str(s) => Bson::String(s.clone()),
                FieldValue::Bool(b) => Bson::Boolean(*b),
            };
            let mut filter = bson::Document::new();
            filter.insert(field.clone(), value);
            filter
        }
        Filter::Contains { fields, text } => {
            let pattern = regex::escape(text);
            let clauses: Vec<Bson> = fields
                .iter()
                .map(|field| {
                    let mut clause = bson::Document::new();
                    clause.insert(
                        field.clone(),
                        doc! { "$regex": pattern.as_str(), "$options": "i" },
                    );
                    Bson::Document(clause)
                })
                .collect();
            doc! { "$or": clauses }
        }
    }
}

/// Map store-native values to the canonical JSON shape
fn to_canonical(document: bson::Document) -> Document {
    canonicalize(Bson::Document(document)).into_relaxed_extjson()
}

fn canonicalize(value: Bson) -> Bson {
    match value {
        Bson::ObjectId(oid) => Bson::String(oid.to_hex()),
        Bson::DateTime(dt) => Bson::String(
            dt.try_to_rfc3339_string()
                .unwrap_or_else(|_| dt.timestamp_millis().to_string()),
        ),
        Bson::Document(d) => Bson::Document(d.into_iter().map(|(k, v)| (k, canonicalize(v))).collect()),
        Bson::Array(items) => Bson::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_value() {
        assert!(matches!(id_value("65f1c2a9e4b0a1b2c3d4e5f6"), Bson::ObjectId(_)));
        assert_eq!(id_value("user-1"), Bson::String("user-1".to_string()));
    }

    #[test]
    fn test_canonical_document() {
        let oid = ObjectId::parse_str("65f1c2a9e4b0a1b2c3d4e5f6").unwrap();
        let created = bson::DateTime::from_millis(1_700_000_000_000);
        let raw = doc! {
            "_id": oid,
            "name": "Sucursal Centro",
            "createdAt": created,
            "coordinates": { "type": "Point", "coordinates": [-82.38, 23.13] },
            "managerIds": [ObjectId::parse_str("65f1c2a9e4b0a1b2c3d4e5f7").unwrap()],
        };

        let canonical = to_canonical(raw);
        assert_eq!(canonical["_id"], "65f1c2a9e4b0a1b2c3d4e5f6");
        let created_at = canonical["createdAt"].as_str().unwrap();
        assert!(created_at.starts_with("2023-11-14T22:13:20"));
        assert_eq!(canonical["coordinates"]["coordinates"], json!([-82.38, 23.13]));
        assert_eq!(canonical["managerIds"][0], "65f1c2a9e4b0a1b2c3d4e5f7");
    }

    #[test]
    fn test_contains_filter_escapes_regex() {
        let filter = to_bson_filter(&Filter::contains(&["name", "description"], "a.b"));
        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 2);
        let first = clauses[0].as_document().unwrap().get_document("name").unwrap();
        assert_eq!(first.get_str("$regex").unwrap(), r"a\.b");
        assert_eq!(first.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn test_eq_filter() {
        let filter = to_bson_filter(&Filter::eq("availability", true));
        assert_eq!(filter.get_bool("availability").unwrap(), true);
    }
}
