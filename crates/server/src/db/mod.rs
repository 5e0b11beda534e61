//! Store abstractions and `PostgreSQL` implementations.
//!
//! The credential, order, and payment-intent stores are CRUD collaborators
//! behind traits so that every component takes its store as an injected
//! dependency. Production wires the `Pg*` implementations; tests use the
//! in-memory doubles from [`memory`].
//!
//! Queries are runtime-checked (`sqlx::query`), so building the crate does
//! not require a live database. Migrations live in `migrations/` and are
//! applied out of band.

pub mod memory;
pub mod orders;
pub mod payments;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use shopkart_core::{Email, OrderId, OrderPaymentStatus, PaymentStatus, UserId};

use crate::models::{NewPaymentIntent, NewUser, Order, PaymentIntent, User};

pub use memory::{MemoryOrderStore, MemoryPaymentStore, MemoryUserStore};
pub use orders::PgOrderStore;
pub use payments::PgPaymentStore;
pub use users::PgUserStore;

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Credential store: persists user identity, password hash+salt, and role.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Insert a new user. Duplicate email yields `RepositoryError::Conflict`.
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Replace the user's address list, returning the updated record.
    async fn update_addresses(
        &self,
        id: UserId,
        addresses: Vec<serde_json::Value>,
    ) -> Result<User, RepositoryError>;
}

/// Order store: lookup plus the single payment-status write used by the
/// settlement reconciler.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Overwrite the order's payment status. The write must be idempotent:
    /// setting an already-set terminal value is a no-op, never an error.
    async fn set_payment_status(
        &self,
        id: OrderId,
        status: OrderPaymentStatus,
    ) -> Result<(), RepositoryError>;
}

/// Payment intent store.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Persist a freshly created intent in `pending` status.
    async fn insert(&self, intent: NewPaymentIntent) -> Result<PaymentIntent, RepositoryError>;

    async fn find_by_intent_id(
        &self,
        intent_id: &str,
    ) -> Result<Option<PaymentIntent>, RepositoryError>;

    /// Overwrite the intent's status (idempotent, like
    /// [`OrderStore::set_payment_status`]).
    async fn set_status(
        &self,
        intent_id: &str,
        status: PaymentStatus,
    ) -> Result<(), RepositoryError>;
}
