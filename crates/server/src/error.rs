//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::payments::PaymentError;
use crate::services::settlement::SettlementError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Payment intent creation failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Settlement notification processing failed.
    #[error("Settlement error: {0}")]
    Settlement(#[from] SettlementError),

    /// Authenticated but not allowed.
    #[error("Forbidden")]
    Forbidden,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error is worth a Sentry event.
    fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Settlement(SettlementError::Repository(_))
                | Self::Payment(PaymentError::Processor(_) | PaymentError::Repository(_))
                | Self::Auth(AuthError::Repository(_) | AuthError::Internal(_))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials
                | AuthError::InvalidToken
                | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
                AuthError::AdminAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::TokenIssuance(_)
                | AuthError::Repository(_)
                | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Payment(err) => match err {
                PaymentError::OrderNotFound => StatusCode::NOT_FOUND,
                PaymentError::Amount(_) => StatusCode::BAD_REQUEST,
                PaymentError::Processor(_) => StatusCode::BAD_GATEWAY,
                PaymentError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Settlement(err) => match err {
                SettlementError::SignatureMismatch => StatusCode::BAD_REQUEST,
                SettlementError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Auth(err) => match err {
                // One message for every credential failure; which field was
                // wrong is never disclosed.
                AuthError::InvalidCredentials
                | AuthError::InvalidToken
                | AuthError::Unauthenticated => "Unauthorized".to_string(),
                AuthError::AdminAlreadyExists => "Admin already exists".to_string(),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::TokenIssuance(_)
                | AuthError::Repository(_)
                | AuthError::Internal(_) => "Internal server error".to_string(),
            },
            Self::Payment(err) => match err {
                PaymentError::OrderNotFound => "Order not found".to_string(),
                PaymentError::Amount(e) => e.to_string(),
                PaymentError::Processor(_) => "External service error".to_string(),
                PaymentError::Repository(_) => "Internal server error".to_string(),
            },
            Self::Settlement(err) => match err {
                SettlementError::SignatureMismatch => "Invalid signature".to_string(),
                SettlementError::Repository(_) => "Internal server error".to_string(),
            },
            Self::Forbidden => "Forbidden".to_string(),
            Self::BadRequest(msg) => msg.clone(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_credential_failures_map_to_401() {
        assert_eq!(
            status_of(AuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AuthError::InvalidToken.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AuthError::Unauthenticated.into()),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_admin_conflict_maps_to_409() {
        assert_eq!(
            status_of(AuthError::AdminAlreadyExists.into()),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_signature_mismatch_maps_to_400() {
        assert_eq!(
            status_of(SettlementError::SignatureMismatch.into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_missing_order_maps_to_404() {
        assert_eq!(
            status_of(PaymentError::OrderNotFound.into()),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_processor_failure_maps_to_502() {
        let err = PaymentError::Processor(crate::services::payments::ProcessorError::Api {
            status: 500,
            message: "upstream".to_string(),
        });
        assert_eq!(status_of(err.into()), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_forbidden_maps_to_403() {
        assert_eq!(status_of(AppError::Forbidden), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }
}
