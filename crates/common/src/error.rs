/// Llego error types
#[derive(Debug, thiserror::Error)]
pub enum LlegoError {
    /// Configuration error (missing credentials, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Embedding provider failure
    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    /// Vector index could not be reached
    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),

    /// Vector index collection does not exist
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// Vector index rejected the request
    #[error("Invalid vector query: {0}")]
    InvalidQuery(String),

    /// Vector search could not be served
    #[error("Vector search unavailable: {0}")]
    SearchUnavailable(String),

    /// Document store error
    #[error("Database error: {0}")]
    Database(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authentication failure
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Conflicting state (duplicate resource, job already running)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LlegoError {
    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create embedding service error
    pub fn embedding_service<S: Into<String>>(msg: S) -> Self {
        Self::EmbeddingService(msg.into())
    }

    /// Create index unavailable error
    pub fn index_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::IndexUnavailable(msg.into())
    }

    /// Create collection not found error
    pub fn collection_not_found<S: Into<String>>(name: S) -> Self {
        Self::CollectionNotFound(name.into())
    }

    /// Create invalid query error
    pub fn invalid_query<S: Into<String>>(msg: S) -> Self {
        Self::InvalidQuery(msg.into())
    }

    /// Create search unavailable error
    pub fn search_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::SearchUnavailable(msg.into())
    }

    /// Create database error
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create not found error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create unauthorized error
    pub fn unauthorized<S: Into<String>>(msg: S) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create conflict error
    pub fn conflict<S: Into<String>>(msg: S) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

// HTTP response conversion
impl LlegoError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::InvalidQuery(_) => 400,
            Self::Json(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::NotFound(_) => 404,
            Self::CollectionNotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::EmbeddingService(_) => 503,
            Self::IndexUnavailable(_) => 503,
            Self::SearchUnavailable(_) => 503,
            Self::Config(_) => 500,
            Self::Database(_) => 500,
            Self::Internal(_) => 500,
            Self::Io(_) => 500,
            Self::Other(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(LlegoError::invalid_query("bad vector").status_code(), 400);
        assert_eq!(LlegoError::unauthorized("nope").status_code(), 401);
        assert_eq!(LlegoError::conflict("running").status_code(), 409);
        assert_eq!(LlegoError::search_unavailable("down").status_code(), 503);
        assert_eq!(LlegoError::config("missing key").status_code(), 500);
    }

    #[test]
    fn test_display() {
        let err = LlegoError::collection_not_found("branches");
        assert_eq!(err.to_string(), "Collection not found: branches");
    }
}
