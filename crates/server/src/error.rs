use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use llego_common::LlegoError;
use serde_json::json;
use std::fmt;
use tracing::{error, warn};

/// HTTP face of `LlegoError`
#[derive(Debug)]
pub struct ApiError(pub LlegoError);

impl From<LlegoError> for ApiError {
    fn from(error: LlegoError) -> Self {
        Self(error)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), "Request failed: {}", self.0);
        } else {
            warn!(status = status.as_u16(), "Request rejected: {}", self.0);
        }

        HttpResponse::build(status)
            .insert_header(ContentType::json())
            .json(json!({
                "error": self.0.to_string(),
                "status": status.as_u16(),
            }))
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
