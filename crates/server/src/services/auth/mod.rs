//! Authentication service.
//!
//! Password registration/login, admin creation, and bearer token
//! issue/validate. Session establishment lives in the middleware layer;
//! this service only produces [`Principal`]s.

mod error;
pub mod password;
pub mod token;

pub use error::AuthError;
pub use token::TokenIssuer;

use std::sync::Arc;

use secrecy::SecretString;
use tracing::instrument;

use shopkart_core::{Email, Role, UserId};

use crate::db::{RepositoryError, UserStore};
use crate::models::{NewUser, Principal, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service over the credential store.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: TokenIssuer,
}

impl AuthService {
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, token_secret: &SecretString) -> Self {
        Self {
            users,
            tokens: TokenIssuer::new(token_secret),
        }
    }

    /// Register a new customer account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` or `AuthError::WeakPassword` on
    /// validation failure; a duplicate email surfaces as a `Conflict`
    /// repository error.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn signup(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.create_user(email, password, Role::Customer).await
    }

    /// Create an admin account. A distinct privileged path: fails with
    /// [`AuthError::AdminAlreadyExists`] if the email is already taken.
    ///
    /// # Errors
    ///
    /// Returns `AdminAlreadyExists`, `InvalidEmail`, `WeakPassword`, or a
    /// repository error.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn create_admin(&self, email: &str, password: &str) -> Result<User, AuthError> {
        match self.create_user(email, password, Role::Admin).await {
            Err(AuthError::Repository(RepositoryError::Conflict(_))) => {
                Err(AuthError::AdminAlreadyExists)
            }
            other => other,
        }
    }

    /// Authenticate with email and password, returning the principal and a
    /// freshly issued bearer token.
    ///
    /// Every failure mode (unknown email, wrong password, store error
    /// during lookup) collapses into `InvalidCredentials` so the caller
    /// learns nothing about which field was wrong.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` on any verification failure.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(Principal, String), AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let user = self
            .users
            .find_by_email(&email)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "credential store lookup failed during login");
                AuthError::InvalidCredentials
            })?
            .ok_or(AuthError::InvalidCredentials)?;

        // Key derivation is CPU-bound; keep it off the async worker.
        let submitted = password.to_owned();
        let salt = user.salt.clone();
        let stored = user.password_hash.clone();
        let verified =
            tokio::task::spawn_blocking(move || password::verify(&submitted, &salt, &stored))
                .await
                .map_err(|_| AuthError::InvalidCredentials)?;

        if !verified {
            return Err(AuthError::InvalidCredentials);
        }

        let principal = user.principal();
        let token = self.tokens.issue(principal)?;
        Ok((principal, token))
    }

    /// Issue a bearer token for an already-authenticated principal.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenIssuance` if signing fails.
    pub fn issue_token(&self, principal: Principal) -> Result<String, AuthError> {
        self.tokens.issue(principal)
    }

    /// Validate a bearer token and resolve it to a fresh principal.
    ///
    /// The signature proves who the token was issued to; the role comes
    /// from the credential store so role changes are observed immediately
    /// even though the token itself is stale. A missing user is
    /// `InvalidToken`, same as a bad signature.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` on signature failure, malformed
    /// claims, or a missing user.
    pub async fn validate_token(&self, token: &str) -> Result<Principal, AuthError> {
        let claims = self.tokens.decode(token)?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "credential store lookup failed during token validation");
                AuthError::InvalidToken
            })?
            .ok_or(AuthError::InvalidToken)?;

        Ok(user.principal())
    }

    /// Fetch the full user record behind a principal.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` if the user no longer exists.
    pub async fn get_user(&self, id: UserId) -> Result<User, AuthError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(AuthError::Unauthenticated)
    }

    async fn create_user(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        let salt = password::generate_salt();
        let submitted = password.to_owned();
        let hash = tokio::task::spawn_blocking(move || password::derive_hash(&submitted, &salt))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let user = self
            .users
            .create(NewUser {
                email,
                role,
                password_hash: hash.to_vec(),
                salt: salt.to_vec(),
            })
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "user created");
        Ok(user)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryUserStore;

    fn service() -> (Arc<MemoryUserStore>, AuthService) {
        let store = Arc::new(MemoryUserStore::new());
        let service = AuthService::new(
            store.clone(),
            &SecretString::from("unit-test-signing-secret-32-bytes!"),
        );
        (store, service)
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let (_, service) = service();
        let user = service
            .signup("shopper@example.com", "a strong password")
            .await
            .expect("signup");
        assert_eq!(user.role, Role::Customer);

        let (principal, token) = service
            .login("shopper@example.com", "a strong password")
            .await
            .expect("login");
        assert_eq!(principal.id, user.id);
        assert!(!token.is_empty());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (_, service) = service();
        service
            .signup("shopper@example.com", "a strong password")
            .await
            .expect("signup");

        let wrong_email = service.login("other@example.com", "a strong password").await;
        let wrong_password = service.login("shopper@example.com", "not the password").await;

        assert!(matches!(wrong_email, Err(AuthError::InvalidCredentials)));
        assert!(matches!(wrong_password, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_admin_creation_is_unique_per_email() {
        let (_, service) = service();
        let admin = service
            .create_admin("boss@example.com", "a strong password")
            .await
            .expect("first admin");
        assert_eq!(admin.role, Role::Admin);

        let second = service.create_admin("boss@example.com", "different pass").await;
        assert!(matches!(second, Err(AuthError::AdminAlreadyExists)));
    }

    #[tokio::test]
    async fn test_token_observes_current_role() {
        let (store, service) = service();
        let user = service
            .signup("promoted@example.com", "a strong password")
            .await
            .expect("signup");

        let (principal, token) = service
            .login("promoted@example.com", "a strong password")
            .await
            .expect("login");
        assert_eq!(principal.role, Role::Customer);

        store.set_role(user.id, Role::Admin);

        let refreshed = service.validate_token(&token).await.expect("validate");
        assert_eq!(refreshed.id, user.id);
        assert_eq!(refreshed.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_token_for_deleted_user_is_invalid() {
        let (_, service) = service();
        let orphan = service
            .issue_token(Principal {
                id: UserId::new(999),
                role: Role::Customer,
            })
            .expect("issue");

        assert!(matches!(
            service.validate_token(&orphan).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_weak_password_rejected() {
        let (_, service) = service();
        let result = service.signup("shopper@example.com", "short").await;
        assert!(matches!(result, Err(AuthError::WeakPassword(_))));
    }
}
