//! Llego text embeddings
//!
//! Provider-agnostic `EmbeddingClient` trait and the Gemini REST implementation.

mod client;
mod embedder;
mod types;

pub use client::{GeminiClient, GeminiConfig};
pub use embedder::EmbeddingClient;
pub use types::{
    ContentEmbedding, Embedding, EmbedContentRequest, EmbedContentResponse, TaskType,
};
