use actix_web::{post, web, HttpResponse};
use llego_common::LlegoError;
use llego_embedding::TaskType;
use llego_vector::{CollectionConfig, Distance};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::error::ApiResult;
use crate::state::AppState;
use crate::types::{CreateCollectionQuery, EmbeddingTestQuery};

/// Create a vector collection if it does not exist yet
#[post("/qdrant/collections")]
pub async fn create_collection(
    query: web::Query<CreateCollectionQuery>,
    state: web::Data<Arc<AppState>>,
) -> ApiResult<HttpResponse> {
    let name = query.collection_name.trim();
    if name.is_empty() {
        return Err(LlegoError::invalid_input("collection_name cannot be empty").into());
    }
    if query.vector_size == 0 {
        return Err(LlegoError::invalid_input("vector_size must be positive").into());
    }
    let distance: Distance = query.distance.parse()?;

    let outcome = state
        .index
        .ensure_collection(name, &CollectionConfig::new(query.vector_size, distance))
        .await?;

    info!("Collection '{}' ensured: {:?}", name, outcome);

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "collection_name": name,
        "vector_size": query.vector_size,
        "distance": distance,
        "outcome": outcome,
    })))
}

/// Embed arbitrary text and return the raw vector
#[post("/embeddings/test")]
pub async fn test_embedding(
    query: web::Query<EmbeddingTestQuery>,
    state: web::Data<Arc<AppState>>,
) -> ApiResult<HttpResponse> {
    let embedding = state
        .embedder
        .embed(&query.text, TaskType::RetrievalDocument)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "text": query.text,
        "model": state.embedder.model(),
        "dimension": embedding.len(),
        "embedding": embedding,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::{configure, test_support};
    use actix_web::{test, App};
    use llego_vector::VectorIndex;
    use serde_json::Value;

    #[actix_web::test]
    async fn test_create_collection_is_idempotent() {
        let ctx = test_support::context().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ctx.state.clone()))
                .configure(configure),
        )
        .await;

        let uri = "/qdrant/collections?collection_name=offers&vector_size=4&distance=Dot";
        let body: Value =
            test::call_and_read_body_json(&app, test::TestRequest::post().uri(uri).to_request())
                .await;
        assert_eq!(body["outcome"], "created");
        assert_eq!(body["distance"], "Dot");

        let body: Value =
            test::call_and_read_body_json(&app, test::TestRequest::post().uri(uri).to_request())
                .await;
        assert_eq!(body["outcome"], "already_exists");
        assert_eq!(
            ctx.index.collection_info("offers").await.unwrap(),
            Some(CollectionConfig::new(4, Distance::Dot))
        );

        let req = test::TestRequest::post()
            .uri("/qdrant/collections?collection_name=offers&distance=Hamming")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
    }

    #[actix_web::test]
    async fn test_embedding_endpoint() {
        let ctx = test_support::context().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ctx.state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/embeddings/test?text=pan")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["dimension"], 2);
        assert_eq!(body["embedding"], json!([1.0, 0.0]));

        let req = test::TestRequest::post()
            .uri("/embeddings/test?text=")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);
    }
}
