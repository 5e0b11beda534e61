//! External payment processor client.
//!
//! The processor speaks a Stripe-style REST API: form-encoded
//! `POST /v1/payment_intents` authenticated with a secret key, returning
//! `{id, client_secret}`. The trait exists so the intent service and the
//! tests can swap in a double.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Default processor API base URL.
const DEFAULT_BASE_URL: &str = "https://api.stripe.com";

/// Errors from the processor API.
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    /// HTTP transport failure.
    #[error("processor request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Processor returned a non-success response.
    #[error("processor API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// A processor-side payment intent, as returned from creation.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorIntent {
    pub id: String,
    pub client_secret: String,
}

/// Server-side payment intent creation at the external processor.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create a payment intent for `amount` minor units of `currency`,
    /// carrying `metadata` opaquely for later webhook correlation.
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<ProcessorIntent, ProcessorError>;
}

/// Stripe payment intents client.
pub struct StripeClient {
    client: reqwest::Client,
    base_url: String,
    secret_key: SecretString,
}

impl StripeClient {
    #[must_use]
    pub fn new(secret_key: SecretString) -> Self {
        Self::with_base_url(secret_key, DEFAULT_BASE_URL.to_owned())
    }

    /// Point the client at a non-default API host (local mock, test
    /// gateway).
    #[must_use]
    pub fn with_base_url(secret_key: SecretString, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            secret_key,
        }
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<ProcessorIntent, ProcessorError> {
        let mut form: Vec<(String, String)> = vec![
            ("amount".to_owned(), amount.to_string()),
            ("currency".to_owned(), currency.to_owned()),
        ];
        for (key, value) in metadata {
            form.push((format!("metadata[{key}]"), value.clone()));
        }

        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.base_url))
            .bearer_auth(self.secret_key.expose_secret())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProcessorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<ProcessorIntent>().await?)
    }
}
