use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::export::ExportError;
use crate::portfolio::validation::ValidationErrors;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bio generation failed: {0}")]
    BioGeneration(String),

    #[error("Payment declined: {0}")]
    Payment(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        tracing::warn!("Rejected session: {e}");
        AppError::Unauthorized
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(errors) => {
                let body = Json(json!({
                    "error": {
                        "code": "VALIDATION_ERROR",
                        "message": "Certains champs sont invalides",
                        "fields": errors.errors,
                    }
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Access denied".to_string(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::BioGeneration(msg) => {
                tracing::error!("Bio generation error: {msg}");
                let body = Json(json!({
                    "error": {
                        "code": "BIO_GENERATION_FAILED",
                        "message": "La génération de la bio a échoué, veuillez réessayer",
                        "retryable": true,
                    }
                }));
                return (StatusCode::SERVICE_UNAVAILABLE, body).into_response();
            }
            AppError::Payment(msg) => (StatusCode::PAYMENT_REQUIRED, "PAYMENT_DECLINED", msg.clone()),
            AppError::Store(e) => {
                tracing::error!("Store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Export(ExportError::TooLarge { width, height }) => {
                tracing::warn!("Export refused: {width}x{height} px snapshot");
                (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "DOCUMENT_TOO_LARGE",
                    "The document is too long to export as a single page".to_string(),
                )
            }
            AppError::Export(e) => {
                tracing::error!("Export error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EXPORT_ERROR",
                    "The document could not be exported".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
