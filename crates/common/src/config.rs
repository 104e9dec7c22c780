use crate::error::LlegoError;
use secrecy::{ExposeSecret, Secret};
use std::path::PathBuf;
use std::time::Duration;

/// Llego application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// MongoDB connection string
    pub mongodb_url: Secret<String>,

    /// MongoDB database name
    pub mongodb_database: String,

    /// Qdrant host, with or without scheme
    pub qdrant_host: String,

    /// Qdrant gRPC port
    pub qdrant_port: u16,

    /// Qdrant API key (Qdrant Cloud)
    pub qdrant_api_key: Option<Secret<String>>,

    /// Use https for Qdrant when the host carries no scheme
    pub qdrant_https: bool,

    /// Qdrant per-call timeout
    pub qdrant_timeout: Duration,

    /// Vector index backend ("qdrant" or "memory")
    pub vector_backend: String,

    /// Snapshot file of the memory vector backend
    pub vector_index_path: PathBuf,

    /// Gemini API key
    pub gemini_api_key: Secret<String>,

    /// Gemini embedding model name
    pub gemini_model: String,

    /// Gemini REST base URL
    pub gemini_base_url: String,

    /// Embedding output dimensionality
    pub embedding_dimension: usize,

    /// Embedding per-call timeout
    pub embedding_timeout: Duration,

    /// Retries on connection failures (request never reached the provider)
    pub embedding_connect_retries: u32,

    /// Default minimum score for product vector search
    pub product_score_threshold: f32,

    /// Default minimum score for branch vector search
    pub branch_score_threshold: f32,

    /// HS256 signing secret for access tokens
    pub jwt_secret: Secret<String>,

    /// Access token lifetime in minutes
    pub jwt_expire_minutes: i64,

    /// Server bind address
    pub server_host: String,

    /// Server port
    pub server_port: u16,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self, LlegoError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LlegoError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| LlegoError::config(format!("{} must be set", key)))
        };

        let config = Self {
            mongodb_url: Secret::new(required("MONGODB_URL")?),
            mongodb_database: get("MONGODB_DATABASE").unwrap_or_else(|| "llego".to_string()),
            qdrant_host: get("QDRANT_HOST").unwrap_or_else(|| "localhost".to_string()),
            qdrant_port: parse_or(&get, "QDRANT_PORT", 6334)?,
            qdrant_api_key: get("QDRANT_API_KEY").map(Secret::new),
            qdrant_https: parse_or(&get, "QDRANT_HTTPS", false)?,
            qdrant_timeout: Duration::from_secs(parse_or(&get, "QDRANT_TIMEOUT", 10)?),
            vector_backend: get("VECTOR_BACKEND")
                .map(|v| v.trim().to_lowercase())
                .unwrap_or_else(|| "qdrant".to_string()),
            vector_index_path: get("VECTOR_INDEX_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data/vector_index.json")),
            gemini_api_key: Secret::new(required("GEMINI_API_KEY")?),
            gemini_model: get("GEMINI_MODEL")
                .unwrap_or_else(|| "gemini-embedding-001".to_string()),
            gemini_base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| {
                "https://generativelanguage.googleapis.com/v1beta".to_string()
            }),
            embedding_dimension: parse_or(&get, "EMBEDDING_DIMENSION", 768)?,
            embedding_timeout: Duration::from_secs(parse_or(&get, "EMBEDDING_TIMEOUT", 30)?),
            embedding_connect_retries: parse_or(&get, "EMBEDDING_CONNECT_RETRIES", 2)?,
            product_score_threshold: parse_or(&get, "PRODUCT_SCORE_THRESHOLD", 0.60)?,
            branch_score_threshold: parse_or(&get, "BRANCH_SCORE_THRESHOLD", 0.55)?,
            jwt_secret: Secret::new(required("JWT_SECRET")?),
            jwt_expire_minutes: parse_or(&get, "JWT_EXPIRE_MINUTES", 60 * 24 * 7)?,
            server_host: get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            server_port: parse_or(&get, "SERVER_PORT", 8000)?,
            log_dir: get("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./log")),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        };

        config.validate()?;

        Ok(config)
    }

    /// Qdrant base URL (scheme://host:port)
    pub fn qdrant_url(&self) -> String {
        let host = self.qdrant_host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}:{}", host, self.qdrant_port)
        } else {
            let scheme = if self.qdrant_https { "https" } else { "http" };
            format!("{}://{}:{}", scheme, host, self.qdrant_port)
        }
    }

    /// Get server bind address (host:port)
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), LlegoError> {
        if self.gemini_api_key.expose_secret().trim().is_empty() {
            return Err(LlegoError::config("GEMINI_API_KEY cannot be empty"));
        }

        if !self.gemini_base_url.starts_with("http://")
            && !self.gemini_base_url.starts_with("https://")
        {
            return Err(LlegoError::config(
                "Gemini base URL must start with http:// or https://",
            ));
        }

        if !matches!(self.vector_backend.as_str(), "qdrant" | "memory") {
            return Err(LlegoError::config(format!(
                "Invalid VECTOR_BACKEND '{}'. Use: qdrant, memory",
                self.vector_backend
            )));
        }

        if self.embedding_dimension == 0 {
            return Err(LlegoError::config("Embedding dimension cannot be 0"));
        }

        for (key, value) in [
            ("PRODUCT_SCORE_THRESHOLD", self.product_score_threshold),
            ("BRANCH_SCORE_THRESHOLD", self.branch_score_threshold),
        ] {
            if !value.is_finite() {
                return Err(LlegoError::config(format!("{} must be a finite number", key)));
            }
        }

        if self.server_port == 0 {
            return Err(LlegoError::config("Server port cannot be 0"));
        }

        if self.jwt_expire_minutes <= 0 {
            return Err(LlegoError::config("JWT_EXPIRE_MINUTES must be positive"));
        }

        Ok(())
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, LlegoError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| LlegoError::config(format!("{} has an invalid value: {}", key, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("MONGODB_URL", "mongodb://localhost:27017"),
            ("GEMINI_API_KEY", "test-key"),
            ("JWT_SECRET", "test-secret"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<AppConfig, LlegoError> {
        AppConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.server_port, 8000);
        assert_eq!(config.mongodb_database, "llego");
        assert_eq!(config.embedding_dimension, 768);
        assert_eq!(config.gemini_model, "gemini-embedding-001");
        assert!((config.product_score_threshold - 0.60).abs() < f32::EPSILON);
        assert!((config.branch_score_threshold - 0.55).abs() < f32::EPSILON);
        assert_eq!(config.qdrant_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_missing_gemini_key_is_config_error() {
        let mut env = base_env();
        env.remove("GEMINI_API_KEY");
        assert!(matches!(load(&env), Err(LlegoError::Config(_))));

        env.insert("GEMINI_API_KEY", "   ");
        assert!(matches!(load(&env), Err(LlegoError::Config(_))));
    }

    #[test]
    fn test_invalid_number() {
        let mut env = base_env();
        env.insert("QDRANT_PORT", "not-a-port");
        assert!(matches!(load(&env), Err(LlegoError::Config(_))));
    }

    #[test]
    fn test_qdrant_url() {
        let mut env = base_env();
        let config = load(&env).unwrap();
        assert_eq!(config.qdrant_url(), "http://localhost:6334");

        env.insert("QDRANT_HTTPS", "true");
        env.insert("QDRANT_HOST", "qdrant.internal");
        env.insert("QDRANT_PORT", "443");
        assert_eq!(load(&env).unwrap().qdrant_url(), "https://qdrant.internal:443");

        env.insert("QDRANT_HOST", "http://qdrant/");
        env.insert("QDRANT_PORT", "6334");
        assert_eq!(load(&env).unwrap().qdrant_url(), "http://qdrant:6334");
    }

    #[test]
    fn test_vector_backend() {
        let mut env = base_env();
        assert_eq!(load(&env).unwrap().vector_backend, "qdrant");

        env.insert("VECTOR_BACKEND", "Memory");
        assert_eq!(load(&env).unwrap().vector_backend, "memory");

        env.insert("VECTOR_BACKEND", "faiss");
        assert!(matches!(load(&env), Err(LlegoError::Config(_))));
    }

    #[test]
    fn test_server_bind_address() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.server_bind_address(), "0.0.0.0:8000");
    }
}
