//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as
//! `{"error": "<message>"}`; server-side failures are captured to Sentry
//! before responding and their details are not sent to the client.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use hostdeck_core::DomainError;
use hostdeck_core::builder::BlockError;
use hostdeck_core::cart::CartError;

use crate::db::{AccessError, RepositoryError};
use crate::payments::PaymentError;
use crate::registrar::RegistrarError;
use crate::services::checkout::CheckoutError;
use crate::services::token::TokenError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Registrar lookup failed.
    #[error("Registrar error: {0}")]
    Registrar(#[from] RegistrarError),

    /// Payment provider call failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller does not own the resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_))
            | Self::BadRequest(_)
            | Self::Payment(PaymentError::InvalidSignature(_) | PaymentError::InvalidPayload(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Database(_) | Self::Internal(_) | Self::Payment(PaymentError::Config(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Registrar(_) | Self::Payment(_) => StatusCode::BAD_GATEWAY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Message sent to the client.
    fn client_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_owned(),
            Self::Database(RepositoryError::Conflict(msg))
            | Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg) => msg.clone(),
            Self::Database(_) | Self::Internal(_) | Self::Payment(PaymentError::Config(_)) => {
                "Internal server error".to_owned()
            }
            Self::Registrar(err) => err.to_string(),
            Self::Payment(err) => err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::NotFound(_) => Self::NotFound(err.to_string()),
            AccessError::Forbidden(_) => Self::Forbidden(err.to_string()),
            AccessError::Repository(inner) => Self::Database(inner),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        Self::Unauthorized(format!("Invalid token: {err}"))
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Cart(_) | CheckoutError::InvalidUrl(_) => {
                Self::BadRequest(err.to_string())
            }
            CheckoutError::Repository(inner) => Self::Database(inner),
            CheckoutError::Payment(inner) => Self::Payment(inner),
        }
    }
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<BlockError> for AppError {
    fn from(err: BlockError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<DomainError> for AppError {
    fn from(_: DomainError) -> Self {
        Self::BadRequest("Invalid domain format".to_owned())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Set the Sentry user context for the authenticated account.
pub fn set_sentry_user(account_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(account_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_errors_render_as_json() {
        let (status, body) = body_of(AppError::NotFound("Plan not found".to_owned())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Plan not found"}));
    }

    #[tokio::test]
    async fn test_database_details_are_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption("bad row 7".to_owned()));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_upstream_errors_are_bad_gateway_with_detail() {
        let err = AppError::Registrar(RegistrarError::Upstream("Domain name not valid".to_owned()));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Domain name not valid");

        let err = AppError::Payment(PaymentError::Api("card declined".to_owned()));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Database(RepositoryError::Conflict("dup".to_owned())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Payment(PaymentError::InvalidSignature("x".to_owned())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(AccessError::Forbidden("Page")).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(AccessError::NotFound("Page")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(TokenError::Expired).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_block_error_message_names_index() {
        let err = AppError::from(BlockError::InvalidKey(2));
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Invalid key at index 2."));
    }
}
