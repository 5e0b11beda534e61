//! `PostgreSQL` order store.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use shopkart_core::{OrderId, OrderPaymentStatus, UserId};

use super::{OrderStore, RepositoryError};
use crate::models::{LineItem, Order};

/// Order store backed by the `orders` table.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn order_from_row(row: &PgRow) -> Result<Order, RepositoryError> {
    let payment_status: String = row.try_get("payment_status")?;
    let payment_status: OrderPaymentStatus = payment_status.parse().map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid payment status in database: {e}"))
    })?;

    let line_items: serde_json::Value = row.try_get("line_items")?;
    let line_items: Vec<LineItem> = serde_json::from_value(line_items)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid line items: {e}")))?;

    Ok(Order {
        id: row.try_get::<OrderId, _>("id")?,
        user_id: row.try_get::<UserId, _>("user_id")?,
        total: row.try_get::<Decimal, _>("total")?,
        currency: row.try_get("currency")?,
        payment_status,
        line_items,
    })
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, user_id, total, currency, payment_status, line_items \
             FROM orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(order_from_row).transpose()
    }

    async fn set_payment_status(
        &self,
        id: OrderId,
        status: OrderPaymentStatus,
    ) -> Result<(), RepositoryError> {
        // Plain overwrite to a terminal value; duplicate settlement
        // deliveries commute at this layer.
        let result = sqlx::query("UPDATE orders SET payment_status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
