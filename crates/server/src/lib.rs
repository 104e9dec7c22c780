//! Llego HTTP server
//!
//! Actix-web REST API over the document store, vector search and the bulk
//! vectorization job.

pub mod auth;
pub mod error;
pub mod job_manager;
pub mod routes;
pub mod state;
pub mod types;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use llego_common::{AppConfig, LlegoError, Result};
use llego_embedding::{EmbeddingClient, GeminiClient, GeminiConfig};
use llego_store::MongoStore;
use llego_vector::{MemoryIndex, QdrantIndex, SearchThresholds, VectorIndex};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;

use crate::auth::JwtIssuer;
use crate::state::AppState;

/// Connect to MongoDB; failure is fatal for every entry point
pub async fn connect_store(config: &AppConfig) -> Result<MongoStore> {
    MongoStore::connect(config.mongodb_url.expose_secret(), &config.mongodb_database).await
}

pub fn build_embedder(config: &AppConfig) -> Result<Arc<dyn EmbeddingClient>> {
    Ok(Arc::new(GeminiClient::new(GeminiConfig::from_app_config(config))?))
}

/// Vector index backend selected by `VECTOR_BACKEND`
pub fn build_vector_index(config: &AppConfig) -> Result<Arc<dyn VectorIndex>> {
    match config.vector_backend.as_str() {
        "memory" => Ok(Arc::new(MemoryIndex::open(&config.vector_index_path)?)),
        "qdrant" => Ok(Arc::new(QdrantIndex::new(config)?)),
        other => Err(LlegoError::config(format!("Unknown vector backend '{}'", other))),
    }
}

/// Start the HTTP server and block until it stops
pub async fn start_server(config: AppConfig) -> Result<()> {
    let mongo = connect_store(&config).await?;
    let embedder = build_embedder(&config)?;
    let index = build_vector_index(&config)?;

    // The index may come up later; searches report it as unavailable meanwhile
    match index.health_check().await {
        Ok(()) => info!("Vector index ({}) is reachable", index.backend()),
        Err(e) => warn!("Vector index ({}) not reachable at startup: {}", index.backend(), e),
    }

    let state = Arc::new(AppState::new(
        Arc::new(mongo.clone()),
        embedder,
        index,
        SearchThresholds::from_config(&config),
        JwtIssuer::from_config(&config),
    ));

    let bind_address = config.server_bind_address();
    info!("Starting HTTP server on {}", bind_address);

    let data = web::Data::new(state);
    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(Cors::permissive())
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind(&bind_address)?
    .run()
    .await?;

    info!("HTTP server stopped");
    mongo.shutdown().await;
    Ok(())
}
