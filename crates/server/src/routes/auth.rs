//! Authentication route handlers.
//!
//! Successful login establishes both credentials the gate accepts: a
//! server-side session and a signed bearer token delivered as an HTTP-only
//! cookie (API clients may instead read it from the response body and send
//! it back in an `Authorization` header).

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{AppendHeaders, IntoResponse},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;

use shopkart_core::{Role, UserId};

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, TOKEN_COOKIE_NAME, clear_principal, set_principal};
use crate::models::{Principal, User};
use crate::state::AppState;

/// Credentials payload shared by signup, login, and admin creation.
#[derive(Debug, Deserialize)]
pub struct CredentialsBody {
    pub email: String,
    pub password: String,
}

/// Public projection of a user record.
#[derive(Debug, Serialize)]
pub struct UserBody {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserBody {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.as_str().to_owned(),
            role: user.role,
        }
    }
}

/// `POST /auth/signup`
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CredentialsBody>,
) -> Result<impl IntoResponse> {
    let user = state.auth().signup(&body.email, &body.password).await?;
    let principal = user.principal();

    establish(&state, &session, principal).await.map(
        |headers| (StatusCode::CREATED, headers, Json(UserBody::from(&user))),
    )
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CredentialsBody>,
) -> Result<impl IntoResponse> {
    let (principal, token) = state.auth().login(&body.email, &body.password).await?;

    set_principal(&session, principal)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    set_sentry_user(&principal.id, None);

    Ok((
        AppendHeaders([(header::SET_COOKIE, token_cookie(&token))]),
        Json(json!({ "id": principal.id, "role": principal.role, "token": token })),
    ))
}

/// `GET /auth/check`
pub async fn check(RequireAuth(principal): RequireAuth) -> Json<Principal> {
    Json(principal)
}

/// `POST /auth/logout`
pub async fn logout(session: Session) -> Result<impl IntoResponse> {
    clear_principal(&session)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    session
        .flush()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    clear_sentry_user();

    Ok((
        AppendHeaders([(header::SET_COOKIE, expired_token_cookie())]),
        StatusCode::NO_CONTENT,
    ))
}

/// `POST /auth/admin`
///
/// Creates the privileged account; conflicts with an existing admin of the
/// same email map to 409.
pub async fn create_admin(
    State(state): State<AppState>,
    Json(body): Json<CredentialsBody>,
) -> Result<impl IntoResponse> {
    let user = state.auth().create_admin(&body.email, &body.password).await?;
    Ok((StatusCode::CREATED, Json(UserBody::from(&user))))
}

/// Record the principal in the session and mint the token cookie.
async fn establish(
    state: &AppState,
    session: &Session,
    principal: Principal,
) -> Result<AppendHeaders<[(header::HeaderName, String); 1]>> {
    set_principal(session, principal)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    set_sentry_user(&principal.id, None);

    let token = state.auth().issue_token(principal)?;
    Ok(AppendHeaders([(header::SET_COOKIE, token_cookie(&token))]))
}

fn token_cookie(token: &str) -> String {
    format!("{TOKEN_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax")
}

fn expired_token_cookie() -> String {
    format!("{TOKEN_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
