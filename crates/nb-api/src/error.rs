//! HTTP mapping for core errors.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use nb_core::error::AppError;
use std::fmt;

/// Wraps `AppError` so handlers can use `?`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self(e)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("request failed: {}", self.0);
        } else {
            log::warn!("request rejected: {}", self.0);
        }
        HttpResponse::build(status).json(serde_json::json!({ "error": self.0.to_string() }))
    }
}
