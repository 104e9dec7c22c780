use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;

/// Entity persisted in a document store collection
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection holding this entity
    const COLLECTION: &'static str;

    /// Wire fields matched by plain text search
    const SEARCH_FIELDS: &'static [&'static str];

    /// Canonical string identifier
    fn id(&self) -> &str;
}

/// Platform user (merchant or customer)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id", default)]
    pub id: String,

    pub name: String,

    pub email: String,

    #[serde(default)]
    pub phone: Option<String>,

    /// PHC-format password hash
    pub password: String,

    #[serde(default = "default_role")]
    pub role: String,

    pub created_at: DateTime<Utc>,
}

fn default_role() -> String {
    "customer".to_string()
}

impl Record for User {
    const COLLECTION: &'static str = "users";
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "email"];

    fn id(&self) -> &str {
        &self.id
    }
}

/// Business owning one or more branches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    #[serde(alias = "_id", default)]
    pub id: String,

    pub name: String,

    /// Kind of business ("coffee", "restaurant", ...)
    #[serde(rename = "type")]
    pub kind: String,

    pub owner_id: String,

    #[serde(default)]
    pub global_rating: f64,

    pub created_at: DateTime<Utc>,
}

impl Record for Business {
    const COLLECTION: &'static str = "businesses";
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "type"];

    fn id(&self) -> &str {
        &self.id
    }
}

/// GeoJSON point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(rename = "type", default = "default_point")]
    pub kind: String,

    /// [longitude, latitude]
    pub coordinates: Vec<f64>,
}

fn default_point() -> String {
    "Point".to_string()
}

/// Physical branch of a business
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    #[serde(alias = "_id", default)]
    pub id: String,

    pub business_id: String,

    pub name: String,

    #[serde(default)]
    pub address: String,

    pub coordinates: Coordinates,

    #[serde(default)]
    pub phone: String,

    /// Opening hours per weekday, e.g. `{"mon": ["08:00-20:00"]}`
    #[serde(default)]
    pub schedule: HashMap<String, Vec<String>>,

    #[serde(default)]
    pub manager_ids: Vec<String>,

    #[serde(default)]
    pub status: String,

    pub created_at: DateTime<Utc>,
}

impl Record for Branch {
    const COLLECTION: &'static str = "branches";
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "address"];

    fn id(&self) -> &str {
        &self.id
    }
}

/// Product sold by a branch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id", default)]
    pub id: String,

    pub branch_id: String,

    #[serde(default)]
    pub category_id: Option<String>,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub weight: String,

    pub price: f64,

    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default)]
    pub image: String,

    #[serde(default = "default_true")]
    pub availability: bool,

    pub created_at: DateTime<Utc>,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_true() -> bool {
    true
}

impl Record for Product {
    const COLLECTION: &'static str = "products";
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "description"];

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    pub name: String,

    #[serde(default)]
    pub image_url: String,
}

/// Product category
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(alias = "_id", default)]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub image_url: String,

    #[serde(default)]
    pub subcategories: Vec<Subcategory>,

    pub created_at: DateTime<Utc>,
}

impl Record for Category {
    const COLLECTION: &'static str = "categories";
    const SEARCH_FIELDS: &'static [&'static str] = &["name"];

    fn id(&self) -> &str {
        &self.id
    }
}
