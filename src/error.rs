use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::db::DbPoolError;

/// Error taxonomy for the service.
///
/// Validation and authentication problems carry a specific message back to the
/// caller; processor and database failures are logged in full and surfaced as a
/// generic internal error so processor/store internals never leak.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid webhook signature")]
    InvalidSignature,

    #[error("payment processor error: {0}")]
    Processor(#[source] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("database pool error: {0}")]
    Pool(#[from] DbPoolError),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServiceError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "authentication required".to_string())
            }
            ServiceError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServiceError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ServiceError::InvalidSignature => {
                (StatusCode::UNAUTHORIZED, "invalid webhook signature".to_string())
            }
            ServiceError::Processor(err) => {
                tracing::error!("Payment processor error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            ServiceError::Database(err) => {
                tracing::error!("Database error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            ServiceError::Pool(err) => {
                tracing::error!("Database pool error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
