use llego_common::LlegoError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Default embedding dimensionality for new collections
pub const DEFAULT_VECTOR_SIZE: usize = 768;

/// Point payload (arbitrary JSON object)
pub type Payload = Map<String, Value>;

/// Payload key holding the source record id
pub const PAYLOAD_RECORD_ID: &str = "id";

/// Distance metric of a collection
///
/// Cosine and Dot scores are similarities (higher is better). Euclid and
/// Manhattan scores are distances (lower is better), and a score threshold
/// then acts as a maximum distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Distance {
    Cosine,
    Euclid,
    Dot,
    Manhattan,
}

impl Distance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "Cosine",
            Self::Euclid => "Euclid",
            Self::Dot => "Dot",
            Self::Manhattan => "Manhattan",
        }
    }

    pub fn higher_is_better(&self) -> bool {
        matches!(self, Self::Cosine | Self::Dot)
    }

    /// Whether `score` passes `threshold` under this metric
    pub fn passes(&self, score: f32, threshold: f32) -> bool {
        if self.higher_is_better() {
            score >= threshold
        } else {
            score <= threshold
        }
    }
}

impl Default for Distance {
    fn default() -> Self {
        Self::Cosine
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Distance {
    type Err = LlegoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "euclid" | "euclidean" => Ok(Self::Euclid),
            "dot" | "dot-product" | "dotproduct" => Ok(Self::Dot),
            "manhattan" => Ok(Self::Manhattan),
            _ => Err(LlegoError::invalid_input(format!(
                "Invalid distance metric '{}'. Use: Cosine, Euclid, Dot, Manhattan",
                s
            ))),
        }
    }
}

/// Vector parameters of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub size: usize,
    pub distance: Distance,
}

impl CollectionConfig {
    pub fn new(size: usize, distance: Distance) -> Self {
        Self { size, distance }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_VECTOR_SIZE, Distance::Cosine)
    }
}

/// Result of `ensure_collection`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnsureOutcome {
    Created,
    AlreadyExists,
}

/// Vector index entry
#[derive(Debug, Clone, PartialEq)]
pub struct IndexPoint {
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub payload: Payload,
}

impl IndexPoint {
    /// Point for a source record; the point id is derived from the record id
    pub fn for_record(record_id: &str, vector: Vec<f32>, mut payload: Payload) -> Self {
        payload.insert(
            PAYLOAD_RECORD_ID.to_string(),
            Value::String(record_id.to_string()),
        );
        Self {
            id: point_id(record_id),
            vector,
            payload,
        }
    }
}

/// Stable point id for a record id
///
/// UUID v5 in the DNS namespace, so re-vectorizing a record overwrites its
/// point and indexes built by earlier deployments keep their ids.
pub fn point_id(record_id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, record_id.as_bytes())
}

/// Search hit returned by the index
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
    pub id: String,
    pub score: f32,
    pub payload: Payload,
}

impl ScoredPoint {
    /// Source record id stored in the payload
    pub fn record_id(&self) -> Option<&str> {
        self.payload.get(PAYLOAD_RECORD_ID).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_id_is_stable() {
        let a = point_id("65f1c2a9e4b0a1b2c3d4e5f6");
        let b = point_id("65f1c2a9e4b0a1b2c3d4e5f6");
        assert_eq!(a, b);
        assert_ne!(a, point_id("65f1c2a9e4b0a1b2c3d4e5f7"));
        assert_eq!(a.get_version_num(), 5);
    }

    #[test]
    fn test_point_for_record_sets_payload_id() {
        let point = IndexPoint::for_record("p1", vec![0.1, 0.2], Payload::new());
        assert_eq!(point.payload["id"], "p1");
        assert_eq!(point.id, point_id("p1"));
    }

    #[test]
    fn test_distance_parse() {
        assert_eq!("Cosine".parse::<Distance>().unwrap(), Distance::Cosine);
        assert_eq!("euclidean".parse::<Distance>().unwrap(), Distance::Euclid);
        assert_eq!("Dot".parse::<Distance>().unwrap(), Distance::Dot);
        assert_eq!("MANHATTAN".parse::<Distance>().unwrap(), Distance::Manhattan);
        assert!("hamming".parse::<Distance>().is_err());
    }

    #[test]
    fn test_threshold_direction() {
        assert!(Distance::Cosine.passes(0.8, 0.6));
        assert!(!Distance::Cosine.passes(0.5, 0.6));
        assert!(Distance::Euclid.passes(0.5, 0.6));
        assert!(!Distance::Manhattan.passes(0.8, 0.6));
    }
}
