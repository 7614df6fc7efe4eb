use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::alignment::error::AlignmentError;
use crate::alignment::history::HistoryError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every variant renders as `{"error": "<message>", "code": "<CODE>"}`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Alignment(#[from] AlignmentError),

    #[error("History error: {0}")]
    History(#[from] HistoryError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl AppError {
    fn status_code_message(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Alignment(err) => {
                let status = match err {
                    AlignmentError::Validation(_) => StatusCode::BAD_REQUEST,
                    AlignmentError::AuthRejected { .. } => StatusCode::UNAUTHORIZED,
                    AlignmentError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                    AlignmentError::Config | AlignmentError::Failed { .. } => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, err.code(), err.user_message())
            }
            AppError::History(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "HISTORY_ERROR",
                format!("Failed to fetch history: {e}"),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.status_code_message();

        match &self {
            AppError::Alignment(AlignmentError::Config) => {
                tracing::error!("GEMINI_API_KEY not found in environment variables")
            }
            AppError::Alignment(AlignmentError::Failed { .. }) | AppError::History(_) => {
                tracing::error!("{self}")
            }
            _ => tracing::warn!("{code}: {self}"),
        }

        let body = Json(json!({
            "error": message,
            "code": code
        }));

        (status, body).into_response()
    }
}
