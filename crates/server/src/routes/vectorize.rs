use actix_web::{post, web, HttpResponse};
use llego_common::LlegoError;
use llego_vector::EntityKind;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::ApiResult;
use crate::state::AppState;

/// Re-embed every record of an entity kind into its collection
///
/// The job runs on its own task so it finishes and settles its task entry
/// even when the client goes away.
#[post("/vectorize/{entity}")]
pub async fn vectorize(
    entity: web::Path<String>,
    state: web::Data<Arc<AppState>>,
) -> ApiResult<HttpResponse> {
    let kind: EntityKind = entity.parse()?;
    let task_id = state
        .job_manager
        .create_task(&format!("vectorize:{}", kind))
        .await?;

    info!(task_id = %task_id, "Vectorization of {} requested", kind);

    let job_state = state.get_ref().clone();
    let job_task_id = task_id.clone();
    let handle = tokio::spawn(async move {
        let result = job_state.vectorizer.vectorize(kind).await;
        match &result {
            Ok(report) => {
                job_state
                    .job_manager
                    .complete_task(&job_task_id, report.message.clone())
                    .await;
            }
            Err(e) => {
                error!(task_id = %job_task_id, "Vectorization of {} failed: {}", kind, e);
                job_state.job_manager.fail_task(&job_task_id, e.to_string()).await;
            }
        }
        result
    });

    match handle.await {
        Ok(result) => Ok(HttpResponse::Ok().json(result?)),
        Err(e) => {
            error!(task_id = %task_id, "Vectorization task of {} aborted: {}", kind, e);
            state.job_manager.fail_task(&task_id, e.to_string()).await;
            Err(LlegoError::internal(format!("Vectorization of {} aborted", kind)).into())
        }
    }
}
