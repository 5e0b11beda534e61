//! `PostgreSQL` credential store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use shopkart_core::{Email, Role, UserId};

use super::{RepositoryError, UserStore};
use crate::models::{NewUser, User};

const USER_COLUMNS: &str = "id, email, role, password_hash, salt, addresses, created_at";

/// Credential store backed by the `users` table.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<User, RepositoryError> {
    let email: String = row.try_get("email")?;
    let email = Email::parse(&email)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid email in database: {e}")))?;

    let role: String = row.try_get("role")?;
    let role: Role = role
        .parse()
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid role in database: {e}")))?;

    let addresses: serde_json::Value = row.try_get("addresses")?;
    let addresses: Vec<serde_json::Value> = serde_json::from_value(addresses)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid addresses: {e}")))?;

    Ok(User {
        id: row.try_get::<UserId, _>("id")?,
        email,
        role,
        password_hash: row.try_get("password_hash")?,
        salt: row.try_get("salt")?,
        addresses,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn map_insert_error(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict("email already registered".to_owned())
        }
        _ => RepositoryError::Database(err),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query(&format!(
            "INSERT INTO users (email, role, password_hash, salt, addresses) \
             VALUES ($1, $2, $3, $4, '[]'::jsonb) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user.email.as_str())
        .bind(user.role.to_string())
        .bind(&user.password_hash)
        .bind(&user.salt)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)?;

        user_from_row(&row)
    }

    async fn update_addresses(
        &self,
        id: UserId,
        addresses: Vec<serde_json::Value>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query(&format!(
            "UPDATE users SET addresses = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(serde_json::Value::Array(addresses))
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        user_from_row(&row)
    }
}
