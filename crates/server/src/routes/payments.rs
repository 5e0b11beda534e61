//! Payment intent route handlers.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopkart_core::OrderId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::state::AppState;

const DEFAULT_CURRENCY: &str = "usd";

/// Intent creation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentBody {
    pub order_id: OrderId,
    pub total_amount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Intent creation response; the client completes payment with this secret.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentBody {
    pub client_secret: String,
}

/// `POST /payments/create-payment-intent`
pub async fn create_intent(
    State(state): State<AppState>,
    RequireAuth(_principal): RequireAuth,
    Json(body): Json<CreateIntentBody>,
) -> Result<impl IntoResponse> {
    let currency = body.currency.as_deref().unwrap_or(DEFAULT_CURRENCY);
    let created = state
        .payments()
        .create_intent(body.order_id, body.total_amount, currency)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(IntentBody {
            client_secret: created.client_secret,
        }),
    ))
}
