//! HTTP error mapping

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use super::dto::ApiResponse;
use crate::pipeline::AnalysisError;
use crate::store::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    FetchFailed(String),
    StoreUnavailable(String),
    DeadlineExceeded(String),
    NotReady(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            ApiError::FetchFailed(msg) => {
                tracing::warn!("Page fetch failed: {}", msg);
                (StatusCode::BAD_GATEWAY, "Failed to load the requested page")
            }
            ApiError::StoreUnavailable(msg) => {
                tracing::error!("Store error: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "Storage unavailable")
            }
            ApiError::DeadlineExceeded(msg) => {
                tracing::warn!("Deadline exceeded: {}", msg);
                (StatusCode::GATEWAY_TIMEOUT, "Analysis timed out")
            }
            ApiError::NotReady(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.as_str()),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(ApiResponse::error(json!({
            "error": error_message,
            "status": status.as_u16()
        })));

        (status, body).into_response()
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::InvalidUrl(msg) => ApiError::BadRequest(format!("Invalid URL: {msg}")),
            AnalysisError::Fetch(e) => ApiError::FetchFailed(e.to_string()),
            AnalysisError::Persist(e) => ApiError::StoreUnavailable(e.to_string()),
            e @ AnalysisError::DeadlineExceeded { .. } => ApiError::DeadlineExceeded(e.to_string()),
            e @ AnalysisError::Encoding(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::StoreUnavailable(err.to_string())
    }
}
