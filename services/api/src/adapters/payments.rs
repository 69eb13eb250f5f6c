//! services/api/src/adapters/payments.rs
//!
//! Stripe implementation of the `PaymentService` port, talking to the
//! payment-intents REST endpoint directly over `reqwest`.

use async_trait::async_trait;
use educonnect_core::domain::{PaymentIntent, PaymentIntentRequest};
use educonnect_core::ports::{PaymentService, PortError, PortResult};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

pub struct StripeAdapter {
    client: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeAdapter {
    /// Builds an adapter whose requests are abandoned after `timeout`.
    pub fn new(secret_key: String, api_base: String, timeout: Duration) -> PortResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Self {
            client,
            secret_key,
            api_base,
        })
    }
}

#[derive(Deserialize)]
struct StripePaymentIntent {
    id: String,
    client_secret: Option<String>,
}

#[derive(Deserialize)]
struct StripeErrorEnvelope {
    error: StripeError,
}

#[derive(Deserialize)]
struct StripeError {
    message: Option<String>,
}

fn map_transport_error(e: reqwest::Error) -> PortError {
    if e.is_timeout() || e.is_connect() {
        PortError::Unavailable(format!("payment processor unreachable: {}", e))
    } else {
        PortError::Unexpected(e.to_string())
    }
}

#[async_trait]
impl PaymentService for StripeAdapter {
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> PortResult<PaymentIntent> {
        let url = format!("{}/v1/payment_intents", self.api_base);
        let form = [
            ("amount", request.amount_minor.to_string()),
            ("currency", request.currency.clone()),
            ("payment_method_types[]", "card".to_string()),
        ];

        let mut builder = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&form);
        if let Some(key) = &request.idempotency_key {
            builder = builder.header("Idempotency-Key", key);
        }

        debug!(
            amount = request.amount_minor,
            currency = %request.currency,
            "creating payment intent"
        );
        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();

        if status.is_server_error() {
            return Err(PortError::Unavailable(format!(
                "payment processor returned {}",
                status
            )));
        }
        if !status.is_success() {
            let message = response
                .json::<StripeErrorEnvelope>()
                .await
                .ok()
                .and_then(|envelope| envelope.error.message)
                .unwrap_or_else(|| format!("payment processor returned {}", status));
            warn!(%status, "payment intent rejected: {}", message);
            return Err(PortError::Rejected(message));
        }

        let intent = response
            .json::<StripePaymentIntent>()
            .await
            .map_err(map_transport_error)?;
        let client_secret = intent.client_secret.ok_or_else(|| {
            PortError::Unexpected(format!("payment intent {} has no client secret", intent.id))
        })?;

        Ok(PaymentIntent {
            id: intent.id,
            client_secret,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_processor_is_unavailable() {
        // Nothing listens on port 1.
        let adapter = StripeAdapter::new(
            "sk_test".to_string(),
            "http://127.0.0.1:1".to_string(),
            Duration::from_secs(2),
        )
        .unwrap();

        let err = adapter
            .create_payment_intent(PaymentIntentRequest {
                amount_minor: 500,
                currency: "usd".to_string(),
                idempotency_key: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Unavailable(_)), "{:?}", err);
    }

    #[test]
    fn stripe_error_message_is_read_from_the_envelope() {
        let body = r#"{"error":{"message":"Amount must be at least 50 cents"}}"#;
        let envelope: StripeErrorEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(
            envelope.error.message.as_deref(),
            Some("Amount must be at least 50 cents")
        );
    }
}
