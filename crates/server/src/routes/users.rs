//! User profile route handlers.

use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;

use shopkart_core::{Role, UserId};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::state::AppState;

/// Profile projection returned to the owning user. Password material is
/// never serialized.
#[derive(Debug, Serialize)]
pub struct ProfileBody {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub addresses: Vec<serde_json::Value>,
}

impl From<User> for ProfileBody {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email.as_str().to_owned(),
            role: user.role,
            addresses: user.addresses,
        }
    }
}

/// `GET /users/own`
pub async fn own(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
) -> Result<Json<ProfileBody>> {
    let user = state.auth().get_user(principal.id).await?;
    Ok(Json(ProfileBody::from(user)))
}

/// `PUT /users/own/addresses`
pub async fn update_addresses(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Json(addresses): Json<Vec<serde_json::Value>>,
) -> Result<impl IntoResponse> {
    let user = state
        .users()
        .update_addresses(principal.id, addresses)
        .await?;
    Ok(Json(ProfileBody::from(user)))
}
