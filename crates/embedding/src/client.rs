use async_trait::async_trait;
use llego_common::{AppConfig, LlegoError, Result};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::embedder::EmbeddingClient;
use crate::types::{
    ApiErrorResponse, Content, Embedding, EmbedContentRequest, EmbedContentResponse, TaskType,
};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini client settings
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Secret<String>,
    pub model: String,
    pub base_url: String,
    pub dimension: usize,
    pub timeout: Duration,
    pub connect_retries: u32,
}

impl GeminiConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            base_url: config.gemini_base_url.clone(),
            dimension: config.embedding_dimension,
            timeout: config.embedding_timeout,
            connect_retries: config.embedding_connect_retries,
        }
    }
}

/// Gemini embeddings REST client
///
/// Calls are never repeated once they may have reached the provider: only
/// connection failures (nothing was sent) are retried.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: Secret<String>,
    model: String,
    base_url: String,
    dimension: usize,
    connect_retries: u32,
    client: Client,
}

impl GeminiClient {
    /// Create new Gemini client
    pub fn new(config: GeminiConfig) -> Result<Self> {
        if config.api_key.expose_secret().trim().is_empty() {
            return Err(LlegoError::config("Gemini API key is missing"));
        }
        if config.dimension == 0 {
            return Err(LlegoError::config("Embedding dimension cannot be 0"));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlegoError::config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            model = %config.model,
            dimension = config.dimension,
            "Gemini embedding client initialized"
        );

        Ok(Self {
            api_key: config.api_key,
            model: config.model,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            dimension: config.dimension,
            connect_retries: config.connect_retries,
            client,
        })
    }

    /// `models/<name>`, accepting names that already carry the prefix
    fn model_path(&self) -> String {
        if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}:{}", self.base_url, self.model_path(), method)
    }

    fn request_for(&self, text: &str, task_type: TaskType) -> EmbedContentRequest {
        EmbedContentRequest {
            model: self.model_path(),
            content: Content::text(text),
            task_type,
            output_dimensionality: Some(self.dimension),
        }
    }

    fn check_dimension(&self, embedding: &Embedding) -> Result<()> {
        if embedding.len() != self.dimension {
            return Err(LlegoError::embedding_service(format!(
                "Expected {}-dimensional embedding, got {}",
                self.dimension,
                embedding.len()
            )));
        }
        Ok(())
    }

    /// POST with retries limited to connection failures
    async fn post_json<B, R>(&self, url: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let sent = self
                .client
                .post(url)
                .header(API_KEY_HEADER, self.api_key.expose_secret())
                .json(body)
                .send()
                .await;

            match sent {
                Ok(response) => return read_response(response).await,
                Err(e) if e.is_connect() && attempt <= self.connect_retries => {
                    let delay = Duration::from_millis(250 * 2u64.pow(attempt - 1));
                    warn!(
                        "Embedding provider unreachable (attempt {}/{}). Retrying in {:?}...",
                        attempt,
                        self.connect_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(transport_error(e)),
            }
        }
    }
}

#[async_trait]
impl EmbeddingClient for GeminiClient {
    async fn embed(&self, text: &str, task_type: TaskType) -> Result<Embedding> {
        if text.trim().is_empty() {
            return Err(LlegoError::invalid_input("Cannot embed empty text"));
        }

        debug!(
            "Generating embedding - Model: {}, Task: {}, Text length: {}",
            self.model,
            task_type,
            text.len()
        );

        let request = self.request_for(text, task_type);
        let response: EmbedContentResponse =
            self.post_json(&self.endpoint("embedContent"), &request).await?;

        let embedding = response.embedding.values;
        self.check_dimension(&embedding)?;

        Ok(embedding)
    }

    async fn check_available(&self) -> Result<()> {
        let url = format!("{}/{}", self.base_url, self.model_path());
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .send()
            .await
            .map_err(transport_error)?;

        let _: serde_json::Value = read_response(response).await?;
        Ok(())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model(&self) -> &str {
        &self.model
    }
}

async fn read_response<R: DeserializeOwned>(response: reqwest::Response) -> Result<R> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(status, &body));
    }

    response
        .json()
        .await
        .map_err(|e| LlegoError::embedding_service(format!("Failed to parse response: {}", e)))
}

fn status_error(status: StatusCode, body: &str) -> LlegoError {
    let detail = serde_json::from_str::<ApiErrorResponse>(body)
        .map(|r| format!("{} ({})", r.error.message, r.error.status))
        .unwrap_or_else(|_| body.chars().take(200).collect());

    LlegoError::embedding_service(format!("Gemini API returned {}: {}", status, detail))
}

fn transport_error(e: reqwest::Error) -> LlegoError {
    if e.is_timeout() {
        LlegoError::embedding_service(format!("Request timed out: {}", e))
    } else if e.is_connect() {
        LlegoError::embedding_service(format!("Failed to connect: {}", e))
    } else {
        LlegoError::embedding_service(format!("Request failed: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GeminiConfig {
        GeminiConfig {
            api_key: Secret::new("key".to_string()),
            model: "gemini-embedding-001".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/".to_string(),
            dimension: 768,
            timeout: Duration::from_secs(5),
            connect_retries: 0,
        }
    }

    #[test]
    fn test_empty_api_key_fails_fast() {
        let mut cfg = config();
        cfg.api_key = Secret::new(String::new());
        assert!(matches!(GeminiClient::new(cfg), Err(LlegoError::Config(_))));
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new(config()).unwrap();
        assert_eq!(
            client.endpoint("embedContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-embedding-001:embedContent"
        );

        let mut cfg = config();
        cfg.model = "models/text-embedding-004".to_string();
        let client = GeminiClient::new(cfg).unwrap();
        assert_eq!(client.model_path(), "models/text-embedding-004");
    }

    #[test]
    fn test_request_carries_task_and_dimension() {
        let client = GeminiClient::new(config()).unwrap();
        let request = client.request_for("pan dulce", TaskType::RetrievalDocument);
        assert_eq!(request.task_type, TaskType::RetrievalDocument);
        assert_eq!(request.output_dimensionality, Some(768));
    }

    #[test]
    fn test_status_error_uses_api_message() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        let err = status_error(StatusCode::TOO_MANY_REQUESTS, body);
        assert!(matches!(err, LlegoError::EmbeddingService(_)));
        assert!(err.to_string().contains("Quota exceeded"));
    }

    #[test]
    fn test_dimension_mismatch() {
        let client = GeminiClient::new(config()).unwrap();
        assert!(client.check_dimension(&vec![0.0; 768]).is_ok());
        assert!(client.check_dimension(&vec![0.0; 3]).is_err());
    }

    #[tokio::test]
    async fn test_empty_text_rejected_without_network() {
        let client = GeminiClient::new(config()).unwrap();
        let result = client.embed("   ", TaskType::RetrievalQuery).await;
        assert!(matches!(result, Err(LlegoError::InvalidInput(_))));
    }
}
