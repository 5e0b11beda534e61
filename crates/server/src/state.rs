//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::{
    OrderStore, PaymentStore, PgOrderStore, PgPaymentStore, PgUserStore, UserStore,
};
use crate::middleware::{AuthStrategy, BearerStrategy, SessionStrategy};
use crate::services::auth::AuthService;
use crate::services::payments::{PaymentProcessor, PaymentService, StripeClient};
use crate::services::settlement::SettlementReconciler;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared services and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    auth: AuthService,
    payments: PaymentService,
    settlement: SettlementReconciler,
    users: Arc<dyn UserStore>,
    strategies: Vec<Box<dyn AuthStrategy>>,
    pool: Option<sqlx::PgPool>,
}

impl AppState {
    /// Create application state backed by `PostgreSQL` stores and the live
    /// payment processor.
    #[must_use]
    pub fn new(config: AppConfig, pool: sqlx::PgPool) -> Self {
        let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool.clone()));
        let orders: Arc<dyn OrderStore> = Arc::new(PgOrderStore::new(pool.clone()));
        let intents: Arc<dyn PaymentStore> = Arc::new(PgPaymentStore::new(pool.clone()));
        let processor = Arc::new(StripeClient::new(config.stripe_secret_key.clone()));

        Self::build(config, users, orders, intents, processor, Some(pool))
    }

    /// Create application state with explicit store and processor
    /// implementations. Tests use this with in-memory stores.
    #[must_use]
    pub fn with_stores(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        orders: Arc<dyn OrderStore>,
        intents: Arc<dyn PaymentStore>,
        processor: Arc<dyn PaymentProcessor>,
    ) -> Self {
        Self::build(config, users, orders, intents, processor, None)
    }

    fn build(
        config: AppConfig,
        users: Arc<dyn UserStore>,
        orders: Arc<dyn OrderStore>,
        intents: Arc<dyn PaymentStore>,
        processor: Arc<dyn PaymentProcessor>,
        pool: Option<sqlx::PgPool>,
    ) -> Self {
        let auth = AuthService::new(users.clone(), &config.jwt_secret);
        let payments = PaymentService::new(orders.clone(), intents.clone(), processor);
        let settlement =
            SettlementReconciler::new(orders, intents, config.webhook_endpoint_secret.clone());
        // Session beats bearer token; within the bearer strategy the token
        // source order comes from config.
        let strategies: Vec<Box<dyn AuthStrategy>> =
            vec![Box::new(SessionStrategy), Box::new(BearerStrategy)];

        Self {
            inner: Arc::new(AppStateInner {
                config,
                auth,
                payments,
                settlement,
                users,
                strategies,
                pool,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the authentication service.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// Get a reference to the payment intent service.
    #[must_use]
    pub fn payments(&self) -> &PaymentService {
        &self.inner.payments
    }

    /// Get a reference to the settlement reconciler.
    #[must_use]
    pub fn settlement(&self) -> &SettlementReconciler {
        &self.inner.settlement
    }

    /// Get a reference to the user store.
    #[must_use]
    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.inner.users
    }

    /// Ordered authentication strategies for the auth gate.
    #[must_use]
    pub fn strategies(&self) -> &[Box<dyn AuthStrategy>] {
        &self.inner.strategies
    }

    /// Database pool, absent when running against in-memory stores.
    #[must_use]
    pub fn pool(&self) -> Option<&sqlx::PgPool> {
        self.inner.pool.as_ref()
    }
}
