use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::billing::ledger::GateRefusal;
use crate::integrations::IntegrationError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Credit gate refused: {0}")]
    Gate(#[from] GateRefusal),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Upstream error: {0}")]
    Upstream(#[from] IntegrationError),

    #[error("S3 error: {0}")]
    S3(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// The message a client sees for this error.
    pub fn public_message(&self) -> String {
        self.parts().2
    }

    fn parts(&self) -> (StatusCode, &'static str, String, Option<Value>) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone(), None),
            AppError::Unauthorized(msg) => {
                tracing::debug!("Rejected request: {msg}");
                (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHORIZED",
                    "Authentication required".to_string(),
                    None,
                )
            }
            AppError::Gate(refusal) => (
                refusal.status(),
                refusal.code(),
                refusal.to_string(),
                Some(refusal.details()),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    None,
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                    None,
                )
            }
            AppError::Upstream(e) => {
                tracing::error!("Upstream error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    format!("{} request failed", e.service()),
                    None,
                )
            }
            AppError::S3(msg) => {
                tracing::error!("S3 error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "S3_ERROR",
                    "A storage error occurred".to_string(),
                    None,
                )
            }
            AppError::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                msg.clone(),
                None,
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::tier::{Feature, Tier};

    #[test]
    fn test_insufficient_credits_maps_to_402_with_details() {
        let err = AppError::from(GateRefusal::InsufficientCredits {
            required: 5,
            available: 4,
            tier: Tier::Free,
        });
        let (status, code, message, details) = err.parts();
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(code, "INSUFFICIENT_CREDITS");
        assert!(message.contains("Pro"), "got: {message}");
        let details = details.unwrap();
        assert_eq!(details["required"], 5);
        assert_eq!(details["available"], 4);
    }

    #[test]
    fn test_feature_not_in_tier_maps_to_403() {
        let err = AppError::from(GateRefusal::FeatureNotInTier {
            feature: Feature::ApplicationLab,
            tier: Tier::Free,
            required_tier: Tier::Pro,
        });
        let (status, code, _, details) = err.parts();
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(code, "FEATURE_NOT_IN_TIER");
        assert_eq!(details.unwrap()["required_tier"], "pro");
    }

    #[test]
    fn test_unauthorized_hides_reason() {
        let err = AppError::Unauthorized("bad signature".to_string());
        let (status, _, message, _) = err.parts();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message, "Authentication required");
    }

    #[test]
    fn test_public_message_hides_internals() {
        let err = AppError::S3("PutObject 403 for bucket offerloop-prod".to_string());
        assert_eq!(err.public_message(), "A storage error occurred");
        let err = AppError::Validation("title cannot be empty".to_string());
        assert_eq!(err.public_message(), "title cannot be empty");
    }

    #[test]
    fn test_upstream_names_service() {
        let err = AppError::from(IntegrationError::Api {
            service: "People Data Labs",
            status: 500,
            message: "boom".to_string(),
        });
        let (status, code, message, _) = err.parts();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(code, "UPSTREAM_ERROR");
        assert_eq!(message, "People Data Labs request failed");
    }
}
