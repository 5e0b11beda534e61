//! Payment intent service.
//!
//! Creates processor-side payment intents for order totals and persists
//! the local intent record. Settlement of those intents is handled by
//! [`crate::services::settlement`].

pub mod processor;

pub use processor::{PaymentProcessor, ProcessorError, ProcessorIntent, StripeClient};

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::instrument;

use shopkart_core::{AmountError, OrderId, to_minor_units};

use crate::db::{OrderStore, PaymentStore, RepositoryError};
use crate::models::NewPaymentIntent;

/// Metadata key under which the order id travels to the processor and
/// back in settlement notifications.
pub const ORDER_ID_METADATA_KEY: &str = "orderId";

/// Errors from payment intent creation.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// Referenced order does not exist.
    #[error("order not found")]
    OrderNotFound,

    /// Order total cannot be expressed in minor units.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// External processor call failed.
    #[error(transparent)]
    Processor(#[from] ProcessorError),

    /// Store operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// What the client needs to complete the payment.
#[derive(Debug, Clone)]
pub struct CreatedIntent {
    pub intent_id: String,
    pub client_secret: String,
}

/// Creates payment intents against the external processor.
pub struct PaymentService {
    orders: Arc<dyn OrderStore>,
    payments: Arc<dyn PaymentStore>,
    processor: Arc<dyn PaymentProcessor>,
}

impl PaymentService {
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderStore>,
        payments: Arc<dyn PaymentStore>,
        processor: Arc<dyn PaymentProcessor>,
    ) -> Self {
        Self {
            orders,
            payments,
            processor,
        }
    }

    /// Create a processor-side payment intent for the given order total
    /// and record it locally in `pending` status.
    ///
    /// All-or-nothing: the local record is only written after the
    /// processor call succeeds, and any failure before that point leaves
    /// no partial record behind.
    ///
    /// # Errors
    ///
    /// `OrderNotFound` if the order does not exist, `Amount` if the total
    /// cannot be expressed in minor units, `Processor` if the external
    /// call fails, `Repository` if persisting the record fails.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn create_intent(
        &self,
        order_id: OrderId,
        total: Decimal,
        currency: &str,
    ) -> Result<CreatedIntent, PaymentError> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or(PaymentError::OrderNotFound)?;

        // Processor minor-unit convention: decimal 49.99 -> 4999.
        let amount = to_minor_units(total)?;

        let mut metadata = HashMap::new();
        metadata.insert(ORDER_ID_METADATA_KEY.to_owned(), order.id.to_string());

        let created = self
            .processor
            .create_payment_intent(amount, currency, &metadata)
            .await?;

        self.payments
            .insert(NewPaymentIntent {
                order_id: order.id,
                intent_id: created.id.clone(),
                client_secret: created.client_secret.clone(),
                amount,
                currency: currency.to_owned(),
                user_id: order.user_id,
                line_items: order.line_items,
                metadata,
            })
            .await?;

        tracing::info!(intent_id = %created.id, amount, "payment intent created");

        Ok(CreatedIntent {
            intent_id: created.id,
            client_secret: created.client_secret,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    use async_trait::async_trait;

    use shopkart_core::{OrderPaymentStatus, UserId};

    use crate::db::{MemoryOrderStore, MemoryPaymentStore};
    use crate::models::Order;

    /// Processor double that records calls and issues a fresh intent per
    /// call, like the real one does.
    #[derive(Default)]
    struct RecordingProcessor {
        calls: Mutex<Vec<(i64, String, HashMap<String, String>)>>,
        counter: AtomicU64,
    }

    #[async_trait]
    impl PaymentProcessor for RecordingProcessor {
        async fn create_payment_intent(
            &self,
            amount: i64,
            currency: &str,
            metadata: &HashMap<String, String>,
        ) -> Result<ProcessorIntent, ProcessorError> {
            self.calls
                .lock()
                .expect("lock poisoned")
                .push((amount, currency.to_owned(), metadata.clone()));
            let n = self.counter.fetch_add(1, Ordering::Relaxed);
            Ok(ProcessorIntent {
                id: format!("pi_{n}"),
                client_secret: format!("pi_{n}_secret_{n:x}"),
            })
        }
    }

    fn dec(s: &str) -> Decimal {
        s.parse().expect("decimal literal")
    }

    fn seeded_order(orders: &MemoryOrderStore) -> OrderId {
        let id = OrderId::new(31);
        orders.seed(Order {
            id,
            user_id: UserId::new(7),
            total: dec("49.99"),
            currency: "usd".to_owned(),
            payment_status: OrderPaymentStatus::Pending,
            line_items: Vec::new(),
        });
        id
    }

    fn service() -> (
        Arc<MemoryOrderStore>,
        Arc<MemoryPaymentStore>,
        Arc<RecordingProcessor>,
        PaymentService,
    ) {
        let orders = Arc::new(MemoryOrderStore::new());
        let payments = Arc::new(MemoryPaymentStore::new());
        let processor = Arc::new(RecordingProcessor::default());
        let service = PaymentService::new(orders.clone(), payments.clone(), processor.clone());
        (orders, payments, processor, service)
    }

    #[tokio::test]
    async fn test_sends_minor_units_and_order_metadata() {
        let (orders, _, processor, service) = service();
        let order_id = seeded_order(&orders);

        service
            .create_intent(order_id, dec("49.99"), "usd")
            .await
            .expect("create intent");

        let calls = processor.calls.lock().expect("lock poisoned");
        let (amount, currency, metadata) = &calls[0];
        assert_eq!(*amount, 4999);
        assert_eq!(currency, "usd");
        assert_eq!(
            metadata.get(ORDER_ID_METADATA_KEY).map(String::as_str),
            Some("31")
        );
    }

    #[tokio::test]
    async fn test_persists_pending_record() {
        let (orders, payments, _, service) = service();
        let order_id = seeded_order(&orders);

        let created = service
            .create_intent(order_id, dec("49.99"), "usd")
            .await
            .expect("create intent");

        let record = payments.get(&created.intent_id).expect("record persisted");
        assert_eq!(record.order_id, order_id);
        assert_eq!(record.amount, 4999);
        assert_eq!(record.status, shopkart_core::PaymentStatus::Pending);
        assert_eq!(record.client_secret, created.client_secret);
    }

    #[tokio::test]
    async fn test_fresh_secret_per_call() {
        let (orders, _, _, service) = service();
        let order_id = seeded_order(&orders);

        let first = service
            .create_intent(order_id, dec("49.99"), "usd")
            .await
            .expect("first");
        let second = service
            .create_intent(order_id, dec("49.99"), "usd")
            .await
            .expect("second");

        assert_ne!(first.client_secret, second.client_secret);
        assert_ne!(first.intent_id, second.intent_id);
    }

    #[tokio::test]
    async fn test_missing_order_is_rejected_before_processor_call() {
        let (_, _, processor, service) = service();

        let result = service
            .create_intent(OrderId::new(404), dec("10.00"), "usd")
            .await;

        assert!(matches!(result, Err(PaymentError::OrderNotFound)));
        assert!(processor.calls.lock().expect("lock poisoned").is_empty());
    }
}
