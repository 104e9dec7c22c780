use actix_web::{get, web, HttpResponse};
use llego_common::LlegoError;
use std::sync::Arc;

use crate::error::ApiResult;
use crate::state::AppState;

#[get("/tasks")]
pub async fn get_tasks(state: web::Data<Arc<AppState>>) -> HttpResponse {
    HttpResponse::Ok().json(state.job_manager.get_tasks().await)
}

#[get("/tasks/{task_id}")]
pub async fn get_task(
    task_id: web::Path<String>,
    state: web::Data<Arc<AppState>>,
) -> ApiResult<HttpResponse> {
    let task = state
        .job_manager
        .get_task(&task_id)
        .await
        .ok_or_else(|| LlegoError::not_found(format!("Task {} not found", task_id)))?;
    Ok(HttpResponse::Ok().json(task))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::{configure, test_support};
    use actix_web::{test, App};
    use serde_json::Value;

    #[actix_web::test]
    async fn test_task_lookup() {
        let ctx = test_support::context().await;
        let id = ctx
            .state
            .job_manager
            .create_task("vectorize:products")
            .await
            .unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ctx.state.clone()))
                .configure(configure),
        )
        .await;

        let body: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/tasks").to_request(),
        )
        .await;
        assert_eq!(body[0]["task_id"], id.as_str());
        assert_eq!(body[0]["status"], "Running");

        let req = test::TestRequest::get()
            .uri(&format!("/tasks/{}", id))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        let req = test::TestRequest::get().uri("/tasks/unknown").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 404);
    }
}
