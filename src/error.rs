use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to create playlist: {0}")]
    PlaylistCreate(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Upstream error: {detail}")]
    Upstream { status: Option<u16>, detail: String },

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": msg }))).into_response()
            }
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                Json(json!({ "error": "Method not allowed" })),
            )
                .into_response(),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, "60")],
                Json(json!({
                    "error": "The Neural Bard is overwhelmed... Please try again later.",
                    "retryAfter": 60,
                })),
            )
                .into_response(),
            AppError::Config(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": msg })))
                    .into_response()
            }
            AppError::PlaylistCreate(detail) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Failed to create playlist",
                    "details": detail,
                })),
            )
                .into_response(),
            AppError::TokenExchange(detail) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Token exchange failed",
                    "details": detail,
                })),
            )
                .into_response(),
            AppError::Upstream { status, detail } => {
                tracing::error!("Upstream error (status {:?}): {}", status, detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "The Neural Bard encountered a mystical error...",
                        "details": detail,
                    })),
                )
                    .into_response()
            }
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
