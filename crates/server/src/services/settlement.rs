//! Settlement reconciliation for asynchronous processor notifications.
//!
//! The processor pushes settlement events to a single inbound endpoint
//! with an HMAC signature header. Signature verification runs over the
//! *raw* request bytes; the payload is only parsed afterwards. Delivery is
//! at-least-once, so every state transition here is a set-to-terminal-value
//! write that is safe to apply repeatedly.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use tracing::instrument;

use shopkart_core::{OrderId, OrderPaymentStatus, PaymentStatus};

use crate::db::{OrderStore, PaymentStore, RepositoryError};
use crate::services::payments::ORDER_ID_METADATA_KEY;

type HmacSha256 = Hmac<Sha256>;

/// Signature header name on inbound settlement deliveries.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Allowed clock skew between the signed timestamp and now.
const SIGNATURE_TOLERANCE_SECS: i64 = 5 * 60;

/// The unparsed notification body, exactly as received on the wire.
///
/// A separate type from the parsed event on purpose: the signature is
/// computed over these bytes, and re-serializing a parsed payload can
/// change the byte layout and invalidate the check.
#[derive(Debug, Clone)]
pub struct RawPayload(Vec<u8>);

impl RawPayload {
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<axum::body::Bytes> for RawPayload {
    fn from(bytes: axum::body::Bytes) -> Self {
        Self(bytes.to_vec())
    }
}

/// Errors from settlement processing.
///
/// Only failures that should stop the acknowledgment surface here; an
/// application-level failure after a verified signature is logged and
/// acked so the processor does not retry a delivery that will not get
/// better.
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    /// Authenticity check failed; the notification is rejected unprocessed.
    #[error("settlement signature mismatch")]
    SignatureMismatch,

    /// Store unavailable; the delivery is retry-eligible.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A parsed settlement notification.
#[derive(Debug, Deserialize)]
pub struct SettlementEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: EventData,
}

#[derive(Debug, Deserialize)]
pub struct EventData {
    pub object: EventObject,
}

#[derive(Debug, Deserialize)]
pub struct EventObject {
    /// Processor intent id.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Verifies and applies settlement notifications.
///
/// The sole writer bridging processor-facing intent state to
/// fulfillment-facing order state.
pub struct SettlementReconciler {
    orders: Arc<dyn OrderStore>,
    payments: Arc<dyn PaymentStore>,
    secret: SecretString,
}

impl SettlementReconciler {
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderStore>,
        payments: Arc<dyn PaymentStore>,
        secret: SecretString,
    ) -> Self {
        Self {
            orders,
            payments,
            secret,
        }
    }

    /// Authenticate and apply a settlement notification.
    ///
    /// `Ok(())` means the delivery is acknowledged - including for unknown
    /// event types and for application-level failures that a retry cannot
    /// fix (those are logged instead).
    ///
    /// # Errors
    ///
    /// `SignatureMismatch` if the authenticity check fails;
    /// `Repository` if the store is unavailable (retry-eligible).
    #[instrument(skip_all)]
    pub async fn reconcile(
        &self,
        payload: &RawPayload,
        signature_header: &str,
    ) -> Result<(), SettlementError> {
        self.verify_signature_at(payload, signature_header, Utc::now().timestamp())?;

        let event: SettlementEvent = match serde_json::from_slice(payload.as_bytes()) {
            Ok(event) => event,
            Err(e) => {
                // Authentic but unparseable; retrying will not change it.
                tracing::warn!(error = %e, "malformed settlement payload, acknowledging");
                return Ok(());
            }
        };

        match event.kind.as_str() {
            "payment_intent.succeeded" => {
                self.apply(
                    &event.data.object,
                    PaymentStatus::Succeeded,
                    Some(OrderPaymentStatus::Received),
                )
                .await
            }
            "payment_intent.payment_failed" => {
                self.apply(
                    &event.data.object,
                    PaymentStatus::Failed,
                    Some(OrderPaymentStatus::Failed),
                )
                .await
            }
            "payment_intent.canceled" => {
                // Order stays as-is; the customer can start a new intent.
                self.apply(&event.data.object, PaymentStatus::Cancelled, None)
                    .await
            }
            other => {
                tracing::debug!(kind = other, "unhandled settlement event type");
                Ok(())
            }
        }
    }

    /// Recompute the expected signature over the raw payload and compare.
    ///
    /// Header format: `t=<unix seconds>,v1=<hex hmac-sha256>`, where the
    /// MAC is over `"{t}.{payload}"`. Multiple `v1` entries are allowed
    /// (secret rotation); any match passes. The comparison itself is
    /// constant-time.
    fn verify_signature_at(
        &self,
        payload: &RawPayload,
        header: &str,
        now: i64,
    ) -> Result<(), SettlementError> {
        let mut timestamp: Option<i64> = None;
        let mut signatures: Vec<Vec<u8>> = Vec::new();

        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => timestamp = value.parse().ok(),
                Some(("v1", value)) => {
                    if let Ok(sig) = hex::decode(value) {
                        signatures.push(sig);
                    }
                }
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(SettlementError::SignatureMismatch)?;
        if signatures.is_empty() {
            return Err(SettlementError::SignatureMismatch);
        }

        if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
            return Err(SettlementError::SignatureMismatch);
        }

        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| SettlementError::SignatureMismatch)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());

        // Mac::verify_slice is constant-time in the signature contents.
        if signatures
            .iter()
            .any(|sig| mac.clone().verify_slice(sig).is_ok())
        {
            Ok(())
        } else {
            Err(SettlementError::SignatureMismatch)
        }
    }

    /// Apply one verified event to the intent record and, optionally, the
    /// order.
    async fn apply(
        &self,
        object: &EventObject,
        intent_status: PaymentStatus,
        order_status: Option<OrderPaymentStatus>,
    ) -> Result<(), SettlementError> {
        if let Some(intent_id) = &object.id {
            match self.payments.find_by_intent_id(intent_id).await {
                Ok(Some(record)) => {
                    if record.status.is_terminal() && record.status != intent_status {
                        // Terminal states are final; a late conflicting
                        // event is recorded but never applied.
                        tracing::warn!(
                            intent_id,
                            current = %record.status,
                            incoming = %intent_status,
                            "conflicting settlement event for terminal intent, ignoring"
                        );
                        return Ok(());
                    }
                    if let Err(e) = self.payments.set_status(intent_id, intent_status).await {
                        return self.ack_or_retry(e, "intent status update failed");
                    }
                }
                Ok(None) => {
                    tracing::warn!(intent_id, "settlement event for unknown intent");
                }
                Err(e) => return self.ack_or_retry(e, "intent lookup failed"),
            }
        }

        let Some(order_status) = order_status else {
            return Ok(());
        };

        let Some(order_id) = object
            .metadata
            .get(ORDER_ID_METADATA_KEY)
            .and_then(|raw| raw.parse::<OrderId>().ok())
        else {
            tracing::warn!("settlement event carries no usable order id, acknowledging");
            return Ok(());
        };

        match self.orders.set_payment_status(order_id, order_status).await {
            Ok(()) => {
                tracing::info!(%order_id, status = %order_status, "order payment status settled");
                Ok(())
            }
            Err(e) => self.ack_or_retry(e, "order status update failed"),
        }
    }

    /// Store unavailability is retry-eligible; everything else is logged
    /// and acknowledged because a redelivery would fail the same way.
    fn ack_or_retry(&self, err: RepositoryError, context: &str) -> Result<(), SettlementError> {
        match err {
            RepositoryError::Database(_) => Err(SettlementError::Repository(err)),
            other => {
                tracing::error!(error = %other, "{context}, acknowledging");
                Ok(())
            }
        }
    }
}
