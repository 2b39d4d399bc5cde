use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Crate-wide error type. Request handlers convert every variant into an
/// HTTP status plus a `{"message": ...}` JSON body; background tasks log
/// instead of propagating.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Not authorized")]
    Unauthorized,

    #[error("quote source error: {0}")]
    Upstream(String),

    #[error("database error: {0}")]
    Persistence(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Upstream(_) | ApiError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

impl From<mongodb::error::Error> for ApiError {
    fn from(e: mongodb::error::Error) -> Self {
        ApiError::Persistence(e.to_string())
    }
}
