use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Festival,
    Event,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Festival => write!(f, "Festival"),
            EntityKind::Event => write!(f, "Event"),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    NotFound(EntityKind, i64),
    Validation(&'static str, String),
    OutOfRange(String),
    InvalidInterval(String),
    Database(anyhow::Error),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(kind, id) => write!(f, "{} {} not found", kind, id),
            AppError::Validation(field, reason) => write!(f, "invalid {}: {}", field, reason),
            AppError::OutOfRange(msg) => write!(f, "out of range: {}", msg),
            AppError::InvalidInterval(msg) => write!(f, "invalid interval: {}", msg),
            AppError::Database(err) => write!(f, "database error: {}", err),
            AppError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::NotFound(..) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Validation(..) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::OutOfRange(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::InvalidInterval(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Database(err) => {
                tracing::error!("database error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Database(err)
    }
}

pub type AppResult<T> = Result<T, AppError>;
