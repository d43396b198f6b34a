//! Mapping of request failures to HTTP responses.

use axum::{http::StatusCode, response::IntoResponse, Json};
use dora_core::error::ServiceFailure;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Service(#[from] ServiceFailure),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}
