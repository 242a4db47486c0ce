use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde_json::json;
use tracing::{debug, error};
use watchlist_dal::FieldErrors;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Body message for unknown or unparsable entry id
pub const NOT_FOUND_MESSAGE: &str = "Customer Not Found";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    ValidationFailed(FieldErrors),

    #[error("{0}")]
    ResourceNotFound(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl From<watchlist_dal::Error> for ApiError {
    fn from(value: watchlist_dal::Error) -> Self {
        match value {
            watchlist_dal::Error::ValidationFailed(errors) => ApiError::ValidationFailed(errors),
            watchlist_dal::Error::RecordNotFound(entity) => {
                debug!("{entity} record not found");
                ApiError::ResourceNotFound(NOT_FOUND_MESSAGE.to_string())
            }
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::ValidationFailed(errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::ValidationFailed(errors) => {
                (StatusCode::BAD_REQUEST, Json(errors)).into_response()
            }
            ApiError::ResourceNotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(json!({"error": msg}))).into_response()
            }
            ApiError::InternalError(msg) => {
                error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "Internal server error"})),
                )
                    .into_response()
            }
        }
    }
}
