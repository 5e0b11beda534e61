//! User identity and the trusted principal projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopkart_core::{Email, Role, UserId};

/// Full user identity record.
///
/// Carries the derived password hash and per-user salt; neither ever leaves
/// the server, and the raw password is never stored. Addresses are kept as
/// free-form JSON documents owned by the storefront frontend.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub role: Role,
    /// PBKDF2-derived hash, fixed length.
    pub password_hash: Vec<u8>,
    /// Per-user random salt, fixed length.
    pub salt: Vec<u8>,
    pub addresses: Vec<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The minimal trusted projection used in authorization decisions.
    #[must_use]
    pub const fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            role: self.role,
        }
    }
}

/// Input for creating a user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub role: Role,
    pub password_hash: Vec<u8>,
    pub salt: Vec<u8>,
}

/// Minimal trusted identity: `{id, role}` and nothing else.
///
/// This is the only user-derived value that crosses into the session store
/// or the bearer token payload. It never carries password material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        user.principal()
    }
}
