//! Payment intent records, the processor-facing system of record.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use shopkart_core::{OrderId, PaymentId, PaymentStatus, UserId};

use super::order::LineItem;

/// Persisted payment intent.
///
/// `status` is mutated only by the settlement reconciler in response to
/// verified processor events; terminal statuses are final.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub id: PaymentId,
    pub order_id: OrderId,
    /// Processor-issued intent id, unique.
    pub intent_id: String,
    pub client_secret: String,
    pub status: PaymentStatus,
    /// Amount in the processor's minor-unit convention.
    pub amount: i64,
    pub currency: String,
    pub user_id: UserId,
    pub line_items: Vec<LineItem>,
    pub metadata: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
}

/// Input for persisting a freshly created intent.
#[derive(Debug, Clone)]
pub struct NewPaymentIntent {
    pub order_id: OrderId,
    pub intent_id: String,
    pub client_secret: String,
    pub amount: i64,
    pub currency: String,
    pub user_id: UserId,
    pub line_items: Vec<LineItem>,
    pub metadata: HashMap<String, String>,
}
