//! End-to-end payment flow: intent creation through settlement.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use shopkart_core::{OrderPaymentStatus, PaymentStatus, UserId};

use common::{ENDPOINT_SECRET, TestApp, body_json, cookie_value, spawn_app};

type HmacSha256 = Hmac<Sha256>;

/// Produce a `t=...,v1=...` signature header for a webhook payload.
fn sign(payload: &[u8], secret: &str) -> String {
    let timestamp = Utc::now().timestamp();
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac key");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!(
        "t={timestamp},v1={}",
        hex::encode(mac.finalize().into_bytes())
    )
}

/// Sign up a customer and return (session cookie, user id).
async fn signed_up_customer(app: &TestApp) -> (String, UserId) {
    let response = app
        .post_json(
            "/auth/signup",
            &json!({"email": "buyer@example.com", "password": "correct horse battery"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let session = cookie_value(&response, "shopkart_session").expect("session cookie");
    let body = body_json(response).await;
    let id = UserId::new(i32::try_from(body["id"].as_i64().expect("id")).expect("i32 id"));
    (session, id)
}

async fn post_webhook(app: &TestApp, payload: Vec<u8>, signature: &str) -> StatusCode {
    app.request(
        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("stripe-signature", signature)
            .body(Body::from(payload))
            .expect("request"),
    )
    .await
    .status()
}

fn succeeded_event(order_id: impl std::fmt::Display, intent_id: &str) -> Vec<u8> {
    json!({
        "type": "payment_intent.succeeded",
        "data": {
            "object": {
                "id": intent_id,
                "metadata": { "orderId": order_id.to_string() }
            }
        }
    })
    .to_string()
    .into_bytes()
}

#[tokio::test]
async fn test_intent_creation_returns_client_secret() {
    let app = spawn_app();
    let (session, user_id) = signed_up_customer(&app).await;
    let order_id = app.seed_order(user_id, "49.99");

    let response = app
        .request(
            Request::builder()
                .method("POST")
                .uri("/payments/create-payment-intent")
                .header(header::COOKIE, &session)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"orderId": order_id, "totalAmount": "49.99"}).to_string(),
                ))
                .expect("request"),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["clientSecret"], "pi_test_1_secret");

    // A pending local record correlates the processor intent to the order.
    let record = app.payments.get("pi_test_1").expect("intent record");
    assert_eq!(record.status, PaymentStatus::Pending);
    assert_eq!(record.order_id, order_id);
    assert_eq!(record.amount, 4999);
}

#[tokio::test]
async fn test_intent_creation_requires_auth() {
    let app = spawn_app();

    let response = app
        .post_json(
            "/payments/create-payment-intent",
            &json!({"orderId": 1, "totalAmount": "10.00"}),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_intent_creation_rejects_unknown_order() {
    let app = spawn_app();
    let (session, _) = signed_up_customer(&app).await;

    let response = app
        .request(
            Request::builder()
                .method("POST")
                .uri("/payments/create-payment-intent")
                .header(header::COOKIE, &session)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"orderId": 9999, "totalAmount": "10.00"}).to_string(),
                ))
                .expect("request"),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_settlement_marks_order_received() {
    let app = spawn_app();
    let (session, user_id) = signed_up_customer(&app).await;
    let order_id = app.seed_order(user_id, "49.99");

    app.request(
        Request::builder()
            .method("POST")
            .uri("/payments/create-payment-intent")
            .header(header::COOKIE, &session)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"orderId": order_id, "totalAmount": "49.99"}).to_string(),
            ))
            .expect("request"),
    )
    .await;

    let payload = succeeded_event(order_id, "pi_test_1");
    let signature = sign(&payload, ENDPOINT_SECRET);

    assert_eq!(post_webhook(&app, payload, &signature).await, StatusCode::OK);
    assert_eq!(
        app.orders.get(order_id).expect("order").payment_status,
        OrderPaymentStatus::Received
    );
    assert_eq!(
        app.payments.get("pi_test_1").expect("intent").status,
        PaymentStatus::Succeeded
    );
}

#[tokio::test]
async fn test_duplicate_settlement_delivery_is_idempotent() {
    let app = spawn_app();
    let (_, user_id) = signed_up_customer(&app).await;
    let order_id = app.seed_order(user_id, "49.99");

    let payload = succeeded_event(order_id, "pi_absent");
    let signature = sign(&payload, ENDPOINT_SECRET);

    assert_eq!(
        post_webhook(&app, payload.clone(), &signature).await,
        StatusCode::OK
    );
    let first = app.orders.get(order_id).expect("order").payment_status;

    assert_eq!(post_webhook(&app, payload, &signature).await, StatusCode::OK);
    let second = app.orders.get(order_id).expect("order").payment_status;

    assert_eq!(first, OrderPaymentStatus::Received);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_forged_settlement_never_mutates_order() {
    let app = spawn_app();
    let (_, user_id) = signed_up_customer(&app).await;
    let order_id = app.seed_order(user_id, "49.99");

    let payload = succeeded_event(order_id, "pi_absent");
    let signature = sign(&payload, "whsec_attacker_controlled_key_123");

    assert_eq!(
        post_webhook(&app, payload, &signature).await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        app.orders.get(order_id).expect("order").payment_status,
        OrderPaymentStatus::Pending
    );
}

#[tokio::test]
async fn test_settlement_without_signature_header_rejected() {
    let app = spawn_app();

    let status = app
        .request(
            Request::builder()
                .method("POST")
                .uri("/webhook")
                .body(Body::from("{}"))
                .expect("request"),
        )
        .await
        .status();

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_settlement_event_acknowledged() {
    let app = spawn_app();

    let payload = json!({
        "type": "customer.created",
        "data": { "object": {} }
    })
    .to_string()
    .into_bytes();
    let signature = sign(&payload, ENDPOINT_SECRET);

    assert_eq!(post_webhook(&app, payload, &signature).await, StatusCode::OK);
}
