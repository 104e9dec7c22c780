use actix_web::{get, web, HttpResponse};
use llego_store::{Branch, Product};
use llego_vector::Vectorizable;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::error::ApiResult;
use crate::state::AppState;
use crate::types::SearchQuery;

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub mode: &'static str,
    pub count: usize,
    pub results: Vec<Value>,
}

#[get("/products/search")]
pub async fn search_products(
    query: web::Query<SearchQuery>,
    state: web::Data<Arc<AppState>>,
) -> ApiResult<HttpResponse> {
    search_entity::<Product>(&state, &query).await
}

#[get("/branches/search")]
pub async fn search_branches(
    query: web::Query<SearchQuery>,
    state: web::Data<Arc<AppState>>,
) -> ApiResult<HttpResponse> {
    search_entity::<Branch>(&state, &query).await
}

/// Semantic search, or plain substring search when `use_vector_search=false`
async fn search_entity<R: Vectorizable>(
    state: &AppState,
    query: &SearchQuery,
) -> ApiResult<HttpResponse> {
    let (mode, results) = if query.use_vector_search {
        let hits = state
            .search
            .search_scored::<R>(&query.query, query.limit, query.score_threshold)
            .await?;
        let results = hits
            .into_iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(llego_common::LlegoError::from)?;
        ("vector", results)
    } else {
        let mut records = state.repo::<R>().search_text(&query.query).await?;
        records.truncate(query.limit);
        let results = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(llego_common::LlegoError::from)?;
        ("text", results)
    };

    Ok(HttpResponse::Ok().json(SearchResponse {
        query: query.query.clone(),
        mode,
        count: results.len(),
        results,
    }))
}
