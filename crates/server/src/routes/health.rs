use actix_web::{get, web, HttpResponse};
use serde_json::json;
use std::sync::Arc;

use crate::state::AppState;

#[get("/")]
pub async fn root() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "message": "Llego backend ready",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Component health; 503 when a backend does not answer
#[get("/health")]
pub async fn health(state: web::Data<Arc<AppState>>) -> HttpResponse {
    let (store, index) = futures::join!(state.store.ping(), state.index.health_check());

    let component = |result: &llego_common::Result<()>| match result {
        Ok(()) => json!({ "status": "up" }),
        Err(e) => json!({ "status": "down", "error": e.to_string() }),
    };

    let healthy = store.is_ok() && index.is_ok();
    let body = json!({
        "status": if healthy { "healthy" } else { "degraded" },
        "components": {
            "document_store": component(&store),
            "vector_index": {
                "backend": state.index.backend(),
                "health": component(&index),
            },
        },
        "embedding_model": state.embedder.model(),
    });

    if healthy {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::{configure, test_support};
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_root_and_health() {
        let ctx = test_support::context().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ctx.state.clone()))
                .configure(configure),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert!(resp.status().is_success());

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["components"]["vector_index"]["backend"], "memory");

        ctx.index.set_offline(true);
        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), 503);
    }
}
