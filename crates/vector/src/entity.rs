use llego_common::LlegoError;
use llego_store::{Branch, Product, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::types::Payload;

/// Entity kinds with a vector collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Products,
    Branches,
}

impl EntityKind {
    /// Vector collection name (same as the document collection)
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Products => Product::COLLECTION,
            Self::Branches => Branch::COLLECTION,
        }
    }

    pub fn default_score_threshold(&self) -> f32 {
        match self {
            Self::Products => 0.60,
            Self::Branches => 0.55,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Branches => "branches",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = LlegoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "products" | "product" => Ok(Self::Products),
            "branches" | "branch" => Ok(Self::Branches),
            _ => Err(LlegoError::invalid_input(format!(
                "Invalid entity type '{}'. Use: products, branches",
                s
            ))),
        }
    }
}

/// Record that can be embedded into a vector collection
pub trait Vectorizable: Record {
    const KIND: EntityKind;

    /// Text sent to the embedding model; blank means "skip"
    fn embedding_text(&self) -> String;

    /// Human-readable label for reports
    fn display_name(&self) -> &str;

    /// Payload stored next to the vector (the record id is added separately)
    fn index_payload(&self) -> Payload {
        let mut payload = Payload::new();
        payload.insert("name".to_string(), Value::String(self.display_name().to_string()));
        payload
    }
}

impl Vectorizable for Product {
    const KIND: EntityKind = EntityKind::Products;

    fn embedding_text(&self) -> String {
        self.name.trim().to_string()
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

impl Vectorizable for Branch {
    const KIND: EntityKind = EntityKind::Branches;

    fn embedding_text(&self) -> String {
        format!("{} {}", self.name.trim(), self.address.trim())
            .trim()
            .to_string()
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}
