//! `PostgreSQL` payment intent store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use shopkart_core::{OrderId, PaymentId, PaymentStatus, UserId};

use super::{PaymentStore, RepositoryError};
use crate::models::{LineItem, NewPaymentIntent, PaymentIntent};

const PAYMENT_COLUMNS: &str = "id, order_id, intent_id, client_secret, status, amount, currency, \
                               user_id, line_items, metadata, created_at";

/// Payment intent store backed by the `payments` table.
#[derive(Clone)]
pub struct PgPaymentStore {
    pool: PgPool,
}

impl PgPaymentStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn intent_from_row(row: &PgRow) -> Result<PaymentIntent, RepositoryError> {
    let status: String = row.try_get("status")?;
    let status: PaymentStatus = status.parse().map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid intent status in database: {e}"))
    })?;

    let line_items: serde_json::Value = row.try_get("line_items")?;
    let line_items: Vec<LineItem> = serde_json::from_value(line_items)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid line items: {e}")))?;

    let metadata: serde_json::Value = row.try_get("metadata")?;
    let metadata: HashMap<String, String> = serde_json::from_value(metadata)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid metadata: {e}")))?;

    Ok(PaymentIntent {
        id: row.try_get::<PaymentId, _>("id")?,
        order_id: row.try_get::<OrderId, _>("order_id")?,
        intent_id: row.try_get("intent_id")?,
        client_secret: row.try_get("client_secret")?,
        status,
        amount: row.try_get("amount")?,
        currency: row.try_get("currency")?,
        user_id: row.try_get::<UserId, _>("user_id")?,
        line_items,
        metadata,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

#[async_trait]
impl PaymentStore for PgPaymentStore {
    async fn insert(&self, intent: NewPaymentIntent) -> Result<PaymentIntent, RepositoryError> {
        let line_items = serde_json::to_value(&intent.line_items)
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;
        let metadata = serde_json::to_value(&intent.metadata)
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        let row = sqlx::query(&format!(
            "INSERT INTO payments \
             (order_id, intent_id, client_secret, status, amount, currency, user_id, line_items, metadata) \
             VALUES ($1, $2, $3, 'pending', $4, $5, $6, $7, $8) \
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(intent.order_id)
        .bind(&intent.intent_id)
        .bind(&intent.client_secret)
        .bind(intent.amount)
        .bind(&intent.currency)
        .bind(intent.user_id)
        .bind(line_items)
        .bind(metadata)
        .fetch_one(&self.pool)
        .await?;

        intent_from_row(&row)
    }

    async fn find_by_intent_id(
        &self,
        intent_id: &str,
    ) -> Result<Option<PaymentIntent>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE intent_id = $1"
        ))
        .bind(intent_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(intent_from_row).transpose()
    }

    async fn set_status(
        &self,
        intent_id: &str,
        status: PaymentStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE payments SET status = $2 WHERE intent_id = $1")
            .bind(intent_id)
            .bind(status.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
