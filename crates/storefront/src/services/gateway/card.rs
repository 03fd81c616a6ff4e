//! Card gateway client (hosted checkout).
//!
//! The provider hosts the card form: we create a checkout session with the
//! charge amount in minor units, redirect the customer to the session URL,
//! and learn the outcome either from the customer's return redirect or from
//! a signed webhook. Webhook signatures are HMAC-SHA256 over
//! `"{timestamp}.{payload}"` with the shared webhook secret.

use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;

use super::{CURRENCY, GatewayError, to_minor_units};
use crate::config::CardGatewayConfig;

type HmacSha256 = Hmac<Sha256>;

/// Webhook event type emitted when a hosted checkout completes.
pub const EVENT_CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Card gateway API client.
#[derive(Clone)]
pub struct CardGateway {
    client: reqwest::Client,
    api_base: String,
    secret_key: SecretString,
    webhook_secret: SecretString,
}

/// Parameters for creating a hosted checkout session.
#[derive(Debug)]
pub struct CardSessionRequest<'a> {
    /// Order number shown on the provider's checkout page.
    pub order_number: &'a str,
    /// Charge amount in major units (post-discount).
    pub amount: Decimal,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
}

/// A created hosted checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct CardSession {
    /// Provider session identifier, stored on the payment row.
    pub id: String,
    /// Hosted checkout page to redirect the customer to.
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct SessionStatus {
    id: String,
    payment_status: String,
    payment_intent: Option<String>,
}

/// A verified, parsed webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    pub object: WebhookObject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookObject {
    /// The checkout session the event refers to.
    pub id: String,
    pub payment_intent: Option<String>,
}

impl CardGateway {
    /// Create a new card gateway client.
    #[must_use]
    pub fn new(config: &CardGatewayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.clone(),
            secret_key: config.secret_key.clone(),
            webhook_secret: config.webhook_secret.clone(),
        }
    }

    /// Create a hosted checkout session for the given amount.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Amount` for unrepresentable amounts,
    /// `Http`/`Api` for transport and provider failures.
    pub async fn create_checkout_session(
        &self,
        request: &CardSessionRequest<'_>,
    ) -> Result<CardSession, GatewayError> {
        let unit_amount = to_minor_units(request.amount)?;
        let product_name = format!("Order {}", request.order_number);

        // The provider takes form-encoded nested keys.
        let form: Vec<(&str, String)> = vec![
            ("mode", "payment".to_string()),
            ("client_reference_id", request.order_number.to_string()),
            ("success_url", request.success_url.to_string()),
            ("cancel_url", request.cancel_url.to_string()),
            (
                "line_items[0][price_data][currency]",
                CURRENCY.to_lowercase(),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                unit_amount.to_string(),
            ),
            ("line_items[0][price_data][product_data][name]", product_name),
            ("line_items[0][quantity]", "1".to_string()),
        ];

        let response = self
            .client
            .post(format!("{}/checkout/sessions", self.api_base))
            .bearer_auth(self.secret_key.expose_secret())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<CardSession>().await?)
    }

    /// Fetch a session and confirm the provider marked it paid. Used on the
    /// customer's return redirect, which carries no trustworthy state of its
    /// own. Returns the provider transaction id.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Rejected` if the session is not paid yet.
    pub async fn confirm_session_paid(&self, session_id: &str) -> Result<String, GatewayError> {
        let response = self
            .client
            .get(format!("{}/checkout/sessions/{session_id}", self.api_base))
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let session: SessionStatus = response.json().await?;
        if session.payment_status != "paid" {
            return Err(GatewayError::Rejected(format!(
                "session {} is {}",
                session.id, session.payment_status
            )));
        }

        Ok(session.payment_intent.unwrap_or(session.id))
    }

    /// Verify a webhook signature and parse the event payload.
    ///
    /// The signature header has the form `t=<unix>,v1=<hex hmac>`; the
    /// signed message is `"{t}.{payload}"`. Comparison is constant-time
    /// via the `Mac::verify_slice` primitive.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Rejected` for bad signatures and `Malformed`
    /// for unparseable headers or payloads.
    pub fn verify_webhook(&self, payload: &str, signature_header: &str) -> Result<WebhookEvent, GatewayError> {
        verify_signature(self.webhook_secret.expose_secret(), payload, signature_header)?;

        serde_json::from_str(payload)
            .map_err(|e| GatewayError::Malformed(format!("webhook payload: {e}")))
    }
}

fn verify_signature(secret: &str, payload: &str, header: &str) -> Result<(), GatewayError> {
    let mut timestamp = None;
    let mut signature = None;

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signature = Some(value),
            _ => {}
        }
    }

    let (Some(timestamp), Some(signature)) = (timestamp, signature) else {
        return Err(GatewayError::Malformed(
            "signature header missing t= or v1=".to_string(),
        ));
    };

    let expected = hex::decode(signature)
        .map_err(|_| GatewayError::Malformed("signature is not hex".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| GatewayError::Malformed("invalid webhook secret length".to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());

    mac.verify_slice(&expected)
        .map_err(|_| GatewayError::Rejected("webhook signature mismatch".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, timestamp: &str, payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.{payload}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn valid_signature_passes() {
        let payload = r#"{"type":"checkout.session.completed"}"#;
        let sig = sign("whsec_test", "1724380000", payload);
        let header = format!("t=1724380000,v1={sig}");

        assert!(verify_signature("whsec_test", payload, &header).is_ok());
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let sig = sign("whsec_test", "1724380000", r#"{"amount":100}"#);
        let header = format!("t=1724380000,v1={sig}");

        let result = verify_signature("whsec_test", r#"{"amount":999}"#, &header);
        assert!(matches!(result, Err(GatewayError::Rejected(_))));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let payload = r#"{"ok":true}"#;
        let sig = sign("whsec_other", "1724380000", payload);
        let header = format!("t=1724380000,v1={sig}");

        let result = verify_signature("whsec_test", payload, &header);
        assert!(matches!(result, Err(GatewayError::Rejected(_))));
    }

    #[test]
    fn missing_header_parts_are_malformed() {
        let result = verify_signature("whsec_test", "{}", "v1=deadbeef");
        assert!(matches!(result, Err(GatewayError::Malformed(_))));
    }

    #[test]
    fn webhook_event_parses() {
        let payload = r#"{
            "type": "checkout.session.completed",
            "data": { "object": { "id": "cs_123", "payment_intent": "pi_456" } }
        }"#;

        let event: WebhookEvent = serde_json::from_str(payload).unwrap();
        assert_eq!(event.event_type, EVENT_CHECKOUT_COMPLETED);
        assert_eq!(event.data.object.id, "cs_123");
        assert_eq!(event.data.object.payment_intent.as_deref(), Some("pi_456"));
    }
}
