//! In-memory store implementations.
//!
//! Test doubles for the store traits, also handy for local development
//! without a database. Interior mutability via `std::sync::Mutex`; no lock
//! is held across an await point.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use shopkart_core::{Email, OrderId, OrderPaymentStatus, PaymentStatus, Role, UserId};

use super::{OrderStore, PaymentStore, RepositoryError, UserStore};
use crate::models::{NewPaymentIntent, NewUser, Order, PaymentIntent, User};

/// In-memory credential store.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<UserId, User>>,
    next_id: AtomicI32,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            next_id: AtomicI32::new(1),
        }
    }

    /// Directly overwrite a user's role (simulates an out-of-band role
    /// change, e.g. by a support tool).
    ///
    /// # Panics
    ///
    /// Panics if the user does not exist or the lock is poisoned.
    pub fn set_role(&self, id: UserId, role: Role) {
        let mut users = self.users.lock().expect("lock poisoned");
        users.get_mut(&id).expect("unknown user").role = role;
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let users = self.users.lock().expect("lock poisoned");
        Ok(users.values().find(|u| &u.email == email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let users = self.users.lock().expect("lock poisoned");
        Ok(users.get(&id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut users = self.users.lock().expect("lock poisoned");
        if users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict(
                "email already registered".to_owned(),
            ));
        }

        let id = UserId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let user = User {
            id,
            email: user.email,
            role: user.role,
            password_hash: user.password_hash,
            salt: user.salt,
            addresses: Vec::new(),
            created_at: Utc::now(),
        };
        users.insert(id, user.clone());
        Ok(user)
    }

    async fn update_addresses(
        &self,
        id: UserId,
        addresses: Vec<serde_json::Value>,
    ) -> Result<User, RepositoryError> {
        let mut users = self.users.lock().expect("lock poisoned");
        let user = users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        user.addresses = addresses;
        Ok(user.clone())
    }
}

/// In-memory order store.
#[derive(Default)]
pub struct MemoryOrderStore {
    orders: Mutex<HashMap<OrderId, Order>>,
}

impl MemoryOrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an order.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    pub fn seed(&self, order: Order) {
        let mut orders = self.orders.lock().expect("lock poisoned");
        orders.insert(order.id, order);
    }

    /// Snapshot an order's current state.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    #[must_use]
    pub fn get(&self, id: OrderId) -> Option<Order> {
        let orders = self.orders.lock().expect("lock poisoned");
        orders.get(&id).cloned()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let orders = self.orders.lock().expect("lock poisoned");
        Ok(orders.get(&id).cloned())
    }

    async fn set_payment_status(
        &self,
        id: OrderId,
        status: OrderPaymentStatus,
    ) -> Result<(), RepositoryError> {
        let mut orders = self.orders.lock().expect("lock poisoned");
        let order = orders.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        order.payment_status = status;
        Ok(())
    }
}

/// In-memory payment intent store.
#[derive(Default)]
pub struct MemoryPaymentStore {
    intents: Mutex<HashMap<String, PaymentIntent>>,
    next_id: AtomicI32,
}

impl MemoryPaymentStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            intents: Mutex::new(HashMap::new()),
            next_id: AtomicI32::new(1),
        }
    }

    /// Snapshot an intent's current state.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    #[must_use]
    pub fn get(&self, intent_id: &str) -> Option<PaymentIntent> {
        let intents = self.intents.lock().expect("lock poisoned");
        intents.get(intent_id).cloned()
    }
}

#[async_trait]
impl PaymentStore for MemoryPaymentStore {
    async fn insert(&self, intent: NewPaymentIntent) -> Result<PaymentIntent, RepositoryError> {
        let mut intents = self.intents.lock().expect("lock poisoned");
        if intents.contains_key(&intent.intent_id) {
            return Err(RepositoryError::Conflict(
                "intent id already recorded".to_owned(),
            ));
        }

        let record = PaymentIntent {
            id: shopkart_core::PaymentId::new(self.next_id.fetch_add(1, Ordering::Relaxed)),
            order_id: intent.order_id,
            intent_id: intent.intent_id.clone(),
            client_secret: intent.client_secret,
            status: PaymentStatus::Pending,
            amount: intent.amount,
            currency: intent.currency,
            user_id: intent.user_id,
            line_items: intent.line_items,
            metadata: intent.metadata,
            created_at: Utc::now(),
        };
        intents.insert(intent.intent_id, record.clone());
        Ok(record)
    }

    async fn find_by_intent_id(
        &self,
        intent_id: &str,
    ) -> Result<Option<PaymentIntent>, RepositoryError> {
        let intents = self.intents.lock().expect("lock poisoned");
        Ok(intents.get(intent_id).cloned())
    }

    async fn set_status(
        &self,
        intent_id: &str,
        status: PaymentStatus,
    ) -> Result<(), RepositoryError> {
        let mut intents = self.intents.lock().expect("lock poisoned");
        let intent = intents.get_mut(intent_id).ok_or(RepositoryError::NotFound)?;
        intent.status = status;
        Ok(())
    }
}
