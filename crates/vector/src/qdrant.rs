use async_trait::async_trait;
use llego_common::{AppConfig, LlegoError, Result};
use qdrant_client::qdrant::{
    point_id::PointIdOptions, value::Kind, vectors_config::Config, CountPointsBuilder,
    CreateCollectionBuilder, Distance as QdrantDistance, ListValue, PointId, PointStruct,
    SearchPointsBuilder, Struct, UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Qdrant, QdrantError};
use secrecy::ExposeSecret;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::index::VectorIndex;
use crate::types::{CollectionConfig, Distance, IndexPoint, Payload, ScoredPoint};

// gRPC status codes
const CODE_INVALID_ARGUMENT: i32 = 3;
const CODE_NOT_FOUND: i32 = 5;
const CODE_ALREADY_EXISTS: i32 = 6;
const CODE_FAILED_PRECONDITION: i32 = 9;

/// Qdrant vector index over gRPC
pub struct QdrantIndex {
    client: Qdrant,
}

impl QdrantIndex {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let url = config.qdrant_url();
        let api_key = config
            .qdrant_api_key
            .as_ref()
            .map(|key| key.expose_secret().clone());

        let client = Qdrant::from_url(&url)
            .api_key(api_key)
            .timeout(config.qdrant_timeout)
            .connect_timeout(config.qdrant_timeout)
            .build()
            .map_err(|e| LlegoError::config(format!("Invalid Qdrant configuration: {}", e)))?;

        info!("Qdrant client configured: {}", url);

        Ok(Self { client })
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    fn backend(&self) -> &'static str {
        "qdrant"
    }

    async fn health_check(&self) -> Result<()> {
        let reply = self
            .client
            .health_check()
            .await
            .map_err(|e| map_error("", e))?;
        debug!("Qdrant {} is healthy", reply.version);
        Ok(())
    }

    async fn collection_info(&self, name: &str) -> Result<Option<CollectionConfig>> {
        let exists = self
            .client
            .collection_exists(name)
            .await
            .map_err(|e| map_error(name, e))?;
        if !exists {
            return Ok(None);
        }

        let response = match self.client.collection_info(name).await {
            Ok(response) => response,
            // Deleted between the two calls
            Err(e) => {
                return match map_error(name, e) {
                    LlegoError::CollectionNotFound(_) => Ok(None),
                    other => Err(other),
                }
            }
        };

        let vectors = response
            .result
            .and_then(|info| info.config)
            .and_then(|config| config.params)
            .and_then(|params| params.vectors_config)
            .and_then(|vectors| vectors.config);

        match vectors {
            Some(Config::Params(params)) => Ok(Some(CollectionConfig::new(
                params.size as usize,
                from_qdrant_distance(params.distance)?,
            ))),
            _ => Err(LlegoError::invalid_query(format!(
                "Collection '{}' does not use a single unnamed vector",
                name
            ))),
        }
    }

    async fn create_collection(&self, name: &str, config: &CollectionConfig) -> Result<()> {
        self.client
            .create_collection(CreateCollectionBuilder::new(name).vectors_config(
                VectorParamsBuilder::new(config.size as u64, to_qdrant_distance(config.distance)),
            ))
            .await
            .map_err(|e| map_error(name, e))?;
        Ok(())
    }

    async fn upsert(&self, collection: &str, point: IndexPoint) -> Result<()> {
        let point_struct = PointStruct {
            id: Some(PointId::from(point.id.to_string())),
            vectors: Some(point.vector.into()),
            payload: to_qdrant_payload(point.payload),
            ..Default::default()
        };

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, vec![point_struct]).wait(true))
            .await
            .map_err(|e| map_error(collection, e))?;
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<ScoredPoint>> {
        let mut request =
            SearchPointsBuilder::new(collection, vector.to_vec(), limit as u64).with_payload(true);
        if let Some(threshold) = score_threshold {
            request = request.score_threshold(threshold);
        }

        let response = self
            .client
            .search_points(request)
            .await
            .map_err(|e| map_error(collection, e))?;

        Ok(response
            .result
            .into_iter()
            .map(|hit| ScoredPoint {
                id: point_id_string(hit.id),
                score: hit.score,
                payload: from_qdrant_payload(hit.payload),
            })
            .collect())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let response = self
            .client
            .count(CountPointsBuilder::new(collection).exact(true))
            .await
            .map_err(|e| map_error(collection, e))?;
        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }
}

fn map_error(collection: &str, error: QdrantError) -> LlegoError {
    match error {
        QdrantError::ResponseError { status } => {
            map_status(collection, status.code() as i32, status.message())
        }
        other => LlegoError::index_unavailable(format!("Qdrant request failed: {}", other)),
    }
}

/// Classify a Qdrant status by code and message
fn map_status(collection: &str, code: i32, message: &str) -> LlegoError {
    let lower = message.to_lowercase();

    if lower.contains("already exists") || code == CODE_ALREADY_EXISTS {
        LlegoError::conflict(format!("Collection '{}' already exists", collection))
    } else if code == CODE_NOT_FOUND || lower.contains("doesn't exist") || lower.contains("not found") {
        LlegoError::collection_not_found(collection)
    } else if code == CODE_INVALID_ARGUMENT || code == CODE_FAILED_PRECONDITION {
        LlegoError::invalid_query(message.to_string())
    } else {
        LlegoError::index_unavailable(format!("Qdrant error (code {}): {}", code, message))
    }
}

fn to_qdrant_distance(distance: Distance) -> QdrantDistance {
    match distance {
        Distance::Cosine => QdrantDistance::Cosine,
        Distance::Euclid => QdrantDistance::Euclid,
        Distance::Dot => QdrantDistance::Dot,
        Distance::Manhattan => QdrantDistance::Manhattan,
    }
}

fn from_qdrant_distance(raw: i32) -> Result<Distance> {
    [
        Distance::Cosine,
        Distance::Euclid,
        Distance::Dot,
        Distance::Manhattan,
    ]
    .into_iter()
    .find(|d| to_qdrant_distance(*d) as i32 == raw)
    .ok_or_else(|| LlegoError::invalid_query(format!("Unknown Qdrant distance {}", raw)))
}

fn point_id_string(id: Option<PointId>) -> String {
    match id.and_then(|id| id.point_id_options) {
        Some(PointIdOptions::Uuid(uuid)) => uuid,
        Some(PointIdOptions::Num(num)) => num.to_string(),
        None => String::new(),
    }
}

fn to_qdrant_payload(payload: Payload) -> HashMap<String, QdrantValue> {
    payload
        .into_iter()
        .map(|(key, value)| (key, to_qdrant_value(value)))
        .collect()
}

fn from_qdrant_payload(payload: HashMap<String, QdrantValue>) -> Payload {
    payload
        .into_iter()
        .map(|(key, value)| (key, from_qdrant_value(value)))
        .collect()
}

fn to_qdrant_value(value: Value) -> QdrantValue {
    let kind = match value {
        Value::Null => Kind::NullValue(0),
        Value::Bool(b) => Kind::BoolValue(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Kind::IntegerValue(i),
            None => Kind::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => Kind::StringValue(s),
        Value::Array(items) => Kind::ListValue(ListValue {
            values: items.into_iter().map(to_qdrant_value).collect(),
        }),
        Value::Object(fields) => Kind::StructValue(Struct {
            fields: fields
                .into_iter()
                .map(|(key, value)| (key, to_qdrant_value(value)))
                .collect(),
        }),
    };
    QdrantValue { kind: Some(kind) }
}

fn from_qdrant_value(value: QdrantValue) -> Value {
    match value.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::from(i),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(d)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => {
            Value::Array(list.values.into_iter().map(from_qdrant_value).collect())
        }
        Some(Kind::StructValue(object)) => Value::Object(
            object
                .fields
                .into_iter()
                .map(|(key, value)| (key, from_qdrant_value(value)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_map_status() {
        assert!(matches!(
            map_status("products", CODE_NOT_FOUND, "Not found: Collection `products` doesn't exist!"),
            LlegoError::CollectionNotFound(_)
        ));
        assert!(matches!(
            map_status("products", CODE_INVALID_ARGUMENT, "Wrong input: Collection `products` already exists!"),
            LlegoError::Conflict(_)
        ));
        assert!(matches!(
            map_status("products", CODE_INVALID_ARGUMENT, "Wrong input: Vector dimension error: expected dim: 768, got 3"),
            LlegoError::InvalidQuery(_)
        ));
        // Unavailable
        assert!(matches!(
            map_status("products", 14, "transport error"),
            LlegoError::IndexUnavailable(_)
        ));
    }

    #[test]
    fn test_distance_mapping() {
        for distance in [Distance::Cosine, Distance::Euclid, Distance::Dot, Distance::Manhattan] {
            let raw = to_qdrant_distance(distance) as i32;
            assert_eq!(from_qdrant_distance(raw).unwrap(), distance);
        }
        assert!(from_qdrant_distance(0).is_err());
    }

    #[test]
    fn test_payload_conversion() {
        let payload = json!({
            "id": "65f1c2a9e4b0a1b2c3d4e5f6",
            "name": "Pan de gloria",
            "price": 2.5,
            "stock": 12,
            "tags": ["dulce", "horneado"],
            "meta": {"available": true, "note": null}
        });
        let map = payload.as_object().cloned().unwrap();

        let back = from_qdrant_payload(to_qdrant_payload(map.clone()));
        assert_eq!(back, map);
    }

    #[test]
    fn test_point_id_string() {
        let uuid = crate::types::point_id("p1").to_string();
        assert_eq!(point_id_string(Some(PointId::from(uuid.clone()))), uuid);
        assert_eq!(point_id_string(Some(PointId::from(42u64))), "42");
        assert_eq!(point_id_string(None), "");
    }
}
