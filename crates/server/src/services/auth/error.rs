//! Authentication error taxonomy.

use shopkart_core::EmailError;

use crate::db::RepositoryError;

/// Errors from the authentication service and middleware.
///
/// `InvalidCredentials` is intentionally indistinguishable between a wrong
/// email and a wrong password; store lookup and derivation failures during
/// login collapse into it as well.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Wrong email or password (deliberately not distinguished).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Admin creation attempted for an email that already has an account.
    #[error("admin already exists")]
    AdminAlreadyExists,

    /// Bad signature, malformed claims, or referenced user missing.
    #[error("invalid token")]
    InvalidToken,

    /// No valid session or bearer token on the request.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Password does not meet minimum requirements.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// Email failed structural validation.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Token signing failed.
    #[error("token issuance failed: {0}")]
    TokenIssuance(String),

    /// Store operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Unexpected server-side failure; detail stays in the logs.
    #[error("internal auth failure: {0}")]
    Internal(String),
}
