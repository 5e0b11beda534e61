//! Order records, the fulfillment-side system of record.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopkart_core::{OrderId, OrderPaymentStatus, ProductId, UserId};

/// A purchased product line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Decimal,
}

/// Order record.
///
/// The order is the system of record for fulfillment state. Its
/// `payment_status` field is written only by the settlement reconciler.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total: Decimal,
    pub currency: String,
    pub payment_status: OrderPaymentStatus,
    pub line_items: Vec<LineItem>,
}
