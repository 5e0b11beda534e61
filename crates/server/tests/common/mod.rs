//! Shared test harness: in-process router over in-memory stores and a
//! stub payment processor.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{Request, Response, header};
use http_body_util::BodyExt;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, SessionManagerLayer};

use shopkart_core::{OrderId, OrderPaymentStatus, UserId};
use shopkart_server::config::{AppConfig, TokenSource};
use shopkart_server::db::{MemoryOrderStore, MemoryPaymentStore, MemoryUserStore};
use shopkart_server::models::Order;
use shopkart_server::routes;
use shopkart_server::services::payments::{PaymentProcessor, ProcessorError, ProcessorIntent};
use shopkart_server::state::AppState;

pub const JWT_SECRET: &str = "k9mQ2vX7pL4wR8nT1zB5cF3hJ6sD0gA2";
pub const ENDPOINT_SECRET: &str = "whsec_k9mQ2vX7pL4wR8nT1zB5cF3hJ6sD0gA2";

/// Processor double: returns deterministic intent ids without network I/O.
#[derive(Default)]
pub struct StubProcessor {
    counter: AtomicU64,
}

#[async_trait]
impl PaymentProcessor for StubProcessor {
    async fn create_payment_intent(
        &self,
        _amount: i64,
        _currency: &str,
        _metadata: &HashMap<String, String>,
    ) -> Result<ProcessorIntent, ProcessorError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ProcessorIntent {
            id: format!("pi_test_{n}"),
            client_secret: format!("pi_test_{n}_secret"),
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub users: Arc<MemoryUserStore>,
    pub orders: Arc<MemoryOrderStore>,
    pub payments: Arc<MemoryPaymentStore>,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: SecretString::from("postgres://unused/test"),
        host: "127.0.0.1".parse().expect("addr"),
        port: 0,
        jwt_secret: SecretString::from(JWT_SECRET),
        stripe_secret_key: SecretString::from("sk_test_k9mQ2vX7pL4wR8nT1zB5"),
        webhook_endpoint_secret: SecretString::from(ENDPOINT_SECRET),
        token_sources: vec![TokenSource::Cookie, TokenSource::Header],
        sentry_dsn: None,
    }
}

pub fn spawn_app() -> TestApp {
    let users = Arc::new(MemoryUserStore::new());
    let orders = Arc::new(MemoryOrderStore::new());
    let payments = Arc::new(MemoryPaymentStore::new());

    let state = AppState::with_stores(
        test_config(),
        users.clone(),
        orders.clone(),
        payments.clone(),
        Arc::new(StubProcessor::default()),
    );

    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_name("shopkart_session")
        .with_http_only(true)
        .with_secure(false);

    let router = routes::router().layer(session_layer).with_state(state);

    TestApp {
        router,
        users,
        orders,
        payments,
    }
}

impl TestApp {
    /// Seed an order owned by `user_id` and return its id.
    pub fn seed_order(&self, user_id: UserId, total: &str) -> OrderId {
        let order_id = OrderId::new(701);
        self.orders.seed(Order {
            id: order_id,
            user_id,
            total: total.parse().expect("decimal total"),
            currency: "usd".to_owned(),
            payment_status: OrderPaymentStatus::Pending,
            line_items: Vec::new(),
        });
        order_id
    }

    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router call")
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> Response<Body> {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
    }

    pub async fn get_with_cookie(&self, uri: &str, cookie: &str) -> Response<Body> {
        self.request(
            Request::builder()
                .uri(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .expect("request"),
        )
        .await
    }
}

/// Collect the response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("json body")
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes()
}

/// Extract a named cookie's `name=value` pair from `Set-Cookie` headers.
pub fn cookie_value(response: &Response<Body>, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for header in response.headers().get_all(header::SET_COOKIE) {
        let Ok(raw) = header.to_str() else { continue };
        let Some(pair) = raw.split(';').next() else {
            continue;
        };
        if pair.trim().starts_with(&prefix) {
            return Some(pair.trim().to_owned());
        }
    }
    None
}
