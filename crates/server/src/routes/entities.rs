use actix_web::{get, web, HttpResponse};
use llego_common::LlegoError;
use llego_store::{Branch, Business, Category, Product, User};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ApiResult;
use crate::state::AppState;
use crate::types::{BranchFilter, ProductFilter, UserView};

#[get("/users")]
pub async fn list_users(state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let users: Vec<UserView> = state
        .repo::<User>()
        .get_all()
        .await?
        .into_iter()
        .map(UserView::from)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

#[get("/businesses")]
pub async fn list_businesses(state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.repo::<Business>().get_all().await?))
}

#[get("/categories")]
pub async fn list_categories(state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.repo::<Category>().get_all().await?))
}

#[get("/categories/{id}")]
pub async fn get_category(
    id: web::Path<String>,
    state: web::Data<Arc<AppState>>,
) -> ApiResult<HttpResponse> {
    let category = state
        .repo::<Category>()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| LlegoError::not_found(format!("Category {} not found", id)))?;
    Ok(HttpResponse::Ok().json(category))
}

#[get("/branches")]
pub async fn list_branches(
    filter: web::Query<BranchFilter>,
    state: web::Data<Arc<AppState>>,
) -> ApiResult<HttpResponse> {
    let repo = state.repo::<Branch>();
    let branches = match &filter.business_id {
        Some(business_id) => repo.find_by("businessId", business_id.as_str()).await?,
        None => repo.get_all().await?,
    };
    Ok(HttpResponse::Ok().json(branches))
}

#[get("/branches/{id}")]
pub async fn get_branch(
    id: web::Path<String>,
    state: web::Data<Arc<AppState>>,
) -> ApiResult<HttpResponse> {
    let branch = state
        .repo::<Branch>()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| LlegoError::not_found(format!("Branch {} not found", id)))?;
    Ok(HttpResponse::Ok().json(branch))
}

/// Products, optionally restricted to ids (kept in request order) and filters
#[get("/products")]
pub async fn list_products(
    filter: web::Query<ProductFilter>,
    state: web::Data<Arc<AppState>>,
) -> ApiResult<HttpResponse> {
    let repo = state.repo::<Product>();

    let mut products = if let Some(ids) = filter.id_list() {
        let mut by_id: HashMap<String, Product> = repo
            .get_by_ids(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        ids.iter().filter_map(|id| by_id.remove(id)).collect()
    } else if let Some(branch_id) = &filter.branch_id {
        repo.find_by("branchId", branch_id.as_str()).await?
    } else if let Some(category_id) = &filter.category_id {
        repo.find_by("categoryId", category_id.as_str()).await?
    } else {
        repo.get_all().await?
    };

    products.retain(|p| {
        filter.branch_id.as_ref().map_or(true, |b| &p.branch_id == b)
            && filter
                .category_id
                .as_ref()
                .map_or(true, |c| p.category_id.as_ref() == Some(c))
            && (!filter.available_only || p.availability)
    });

    Ok(HttpResponse::Ok().json(products))
}

#[get("/products/{id}")]
pub async fn get_product(
    id: web::Path<String>,
    state: web::Data<Arc<AppState>>,
) -> ApiResult<HttpResponse> {
    let product = state
        .repo::<Product>()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| LlegoError::not_found(format!("Product {} not found", id)))?;
    Ok(HttpResponse::Ok().json(product))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::{configure, test_support};
    use actix_web::{test, App};
    use serde_json::Value;

    async fn get_json(uri: &str) -> (u16, Value) {
        let ctx = test_support::context().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ctx.state.clone()))
                .configure(configure),
        )
        .await;
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        let status = resp.status().as_u16();
        (status, test::read_body_json(resp).await)
    }

    fn ids(body: &Value) -> Vec<&str> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|v| v["id"].as_str().unwrap())
            .collect()
    }

    #[actix_web::test]
    async fn test_products_by_ids_keep_request_order() {
        let (status, body) = get_json("/products?ids=p3,missing,p1").await;
        assert_eq!(status, 200);
        assert_eq!(ids(&body), vec!["p3", "p1"]);
    }

    #[actix_web::test]
    async fn test_product_filters() {
        let (_, body) = get_json("/products?branchId=b1&availableOnly=true").await;
        assert_eq!(ids(&body), vec!["p1"]);

        let (_, body) = get_json("/products?categoryId=c2").await;
        assert_eq!(ids(&body), vec!["p3"]);
    }

    #[actix_web::test]
    async fn test_get_by_id() {
        let (status, body) = get_json("/products/p2").await;
        assert_eq!(status, 200);
        assert_eq!(body["name"], "Pastel de guayaba");

        let (status, body) = get_json("/branches/nope").await;
        assert_eq!(status, 404);
        assert!(body["error"].as_str().unwrap().contains("nope"));

        let (status, body) = get_json("/categories/c1").await;
        assert_eq!(status, 200);
        assert_eq!(body["subcategories"][0]["name"], "Pasteles");
    }

    #[actix_web::test]
    async fn test_branches_by_business() {
        let (_, body) = get_json("/branches?businessId=biz1").await;
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (_, body) = get_json("/branches?businessId=other").await;
        assert!(body.as_array().unwrap().is_empty());

        let (_, body) = get_json("/businesses").await;
        assert_eq!(body[0]["type"], "restaurant");
    }
}
