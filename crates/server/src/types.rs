use chrono::{DateTime, Utc};
use llego_store::User;
use serde::{Deserialize, Serialize};

/// Task status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskStatus {
    Running,
    Completed,
    Failed,
}

/// Background task information
#[derive(Debug, Clone, Serialize)]
pub struct TaskInfo {
    pub task_id: String,

    /// Task type, e.g. `vectorize:products`
    pub task_type: String,

    pub status: TaskStatus,

    pub message: String,

    pub started_at: DateTime<Utc>,

    pub finished_at: Option<DateTime<Utc>>,
}

/// Search query (`/products/search`, `/branches/search`)
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,

    #[serde(default = "default_limit")]
    pub limit: usize,

    #[serde(default = "default_true")]
    pub use_vector_search: bool,

    pub score_threshold: Option<f32>,
}

fn default_limit() -> usize {
    10
}

fn default_true() -> bool {
    true
}

/// Product listing filters
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    /// Comma-separated ids
    pub ids: Option<String>,

    pub branch_id: Option<String>,

    pub category_id: Option<String>,

    #[serde(default)]
    pub available_only: bool,
}

impl ProductFilter {
    pub fn id_list(&self) -> Option<Vec<String>> {
        self.ids.as_ref().map(|ids| {
            ids.split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchFilter {
    pub business_id: Option<String>,
}

/// `POST /qdrant/collections` parameters
#[derive(Debug, Deserialize)]
pub struct CreateCollectionQuery {
    pub collection_name: String,

    #[serde(default = "default_vector_size")]
    pub vector_size: usize,

    #[serde(default = "default_distance")]
    pub distance: String,
}

fn default_vector_size() -> usize {
    llego_vector::DEFAULT_VECTOR_SIZE
}

fn default_distance() -> String {
    "Cosine".to_string()
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingTestQuery {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// User as exposed over HTTP (no password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Issued access token
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserView,
}
