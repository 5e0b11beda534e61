//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Liveness check
//! GET  /health/ready                  - Readiness check (database ping)
//!
//! # Auth
//! POST /auth/signup                   - Register a customer account
//! POST /auth/login                    - Authenticate, establish session + token
//! GET  /auth/check                    - Report the authenticated principal
//! POST /auth/logout                   - Destroy session, expire token cookie
//! POST /auth/admin                    - Create the admin account (409 if taken)
//!
//! # Users (requires auth)
//! GET  /users/own                     - Current user's profile
//! PUT  /users/own/addresses           - Replace the current user's addresses
//!
//! # Payments (requires auth)
//! POST /payments/create-payment-intent - Create a processor payment intent
//!
//! # Settlement
//! POST /webhook                       - Inbound processor notifications (signed)
//! ```

pub mod auth;
pub mod payments;
pub mod users;
pub mod webhook;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/check", get(auth::check))
        .route("/logout", post(auth::logout))
        .route("/admin", post(auth::create_admin))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/own", get(users::own))
        .route("/own/addresses", put(users::update_addresses))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new().route("/create-payment-intent", post(payments::create_intent))
}

/// Create all routes for the server.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/payments", payment_routes())
        .route("/webhook", post(webhook::receive))
}

/// Liveness probe.
async fn health() -> &'static str {
    "OK"
}

/// Readiness probe; pings the database when one is configured.
async fn ready(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };
    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::error!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
