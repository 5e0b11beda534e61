//! Authentication middleware and extractors.
//!
//! The gate runs an ordered list of [`AuthStrategy`] values; the first one
//! that resolves a [`Principal`] wins and the principal is attached to the
//! request. A request that no strategy can resolve is rejected with 401 and
//! no detail about what was tried.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tower_sessions::Session;

use shopkart_core::Role;

use crate::config::TokenSource;
use crate::error::AppError;
use crate::models::{Principal, session_keys};
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Cookie carrying the bearer token set at login.
pub const TOKEN_COOKIE_NAME: &str = "jwt";

/// One way of resolving a principal from request parts.
///
/// Strategies never reject; a credential that is absent, expired, or fails
/// validation resolves to `None` so the next strategy gets a chance.
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    async fn try_resolve(&self, parts: &mut Parts, state: &AppState) -> Option<Principal>;
}

/// Resolves the principal stored in the server-side session.
pub struct SessionStrategy;

#[async_trait]
impl AuthStrategy for SessionStrategy {
    async fn try_resolve(&self, parts: &mut Parts, _state: &AppState) -> Option<Principal> {
        // Session is inserted into extensions by SessionManagerLayer.
        let session = parts.extensions.get::<Session>()?;
        session
            .get::<Principal>(session_keys::PRINCIPAL)
            .await
            .ok()
            .flatten()
    }
}

/// Resolves a signed bearer token from the configured sources, in order.
pub struct BearerStrategy;

#[async_trait]
impl AuthStrategy for BearerStrategy {
    async fn try_resolve(&self, parts: &mut Parts, state: &AppState) -> Option<Principal> {
        for source in &state.config().token_sources {
            let token = match source {
                TokenSource::Cookie => token_from_cookie(parts),
                TokenSource::Header => token_from_authorization(parts),
            };
            let Some(token) = token else { continue };
            if let Ok(principal) = state.auth().validate_token(&token).await {
                return Some(principal);
            }
        }
        None
    }
}

/// Pull the token out of the `jwt` cookie, if present.
fn token_from_cookie(parts: &Parts) -> Option<String> {
    for value in parts.headers.get_all(header::COOKIE) {
        let raw = value.to_str().ok()?;
        for pair in raw.split(';') {
            if let Some((name, token)) = pair.trim().split_once('=')
                && name == TOKEN_COOKIE_NAME
                && !token.is_empty()
            {
                return Some(token.to_owned());
            }
        }
    }
    None
}

/// Pull the token out of an `Authorization: Bearer` header, if present.
fn token_from_authorization(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_owned)
}

/// Extractor that requires an authenticated principal.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(principal): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("user {}", principal.id)
/// }
/// ```
pub struct RequireAuth(pub Principal);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        for strategy in state.strategies() {
            if let Some(principal) = strategy.try_resolve(parts, state).await {
                // Downstream layers (request logging, handlers taking raw
                // parts) read the principal from extensions.
                parts.extensions.insert(principal);
                return Ok(Self(principal));
            }
        }
        Err(AuthError::Unauthenticated.into())
    }
}

/// Extractor that requires an authenticated admin.
pub struct RequireAdmin(pub Principal);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(principal) = RequireAuth::from_request_parts(parts, state).await?;
        if principal.role != Role::Admin {
            return Err(AppError::Forbidden);
        }
        Ok(Self(principal))
    }
}

/// Record the principal in the session after a successful login.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_principal(
    session: &Session,
    principal: Principal,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::PRINCIPAL, principal).await
}

/// Drop the principal from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_principal(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<Principal>(session_keys::PRINCIPAL).await?;
    Ok(())
}
