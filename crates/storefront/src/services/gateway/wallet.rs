//! Wallet gateway client (redirect approval flow).
//!
//! The wallet provider's flow is two-legged: create a payment and redirect
//! the customer to the returned approval URL, then execute the payment with
//! the payer id the provider appends to the return redirect. Amounts travel
//! as two-decimal strings. An OAuth client-credentials token is requested
//! per call; the provider's tokens are long-lived enough that caching is
//! not worth the state.

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use super::{CURRENCY, GatewayError, format_major_units};
use crate::config::WalletGatewayConfig;

/// Wallet gateway API client.
#[derive(Clone)]
pub struct WalletGateway {
    client: reqwest::Client,
    api_base: String,
    client_id: String,
    client_secret: SecretString,
}

/// A created wallet payment awaiting customer approval.
#[derive(Debug, Clone)]
pub struct WalletApproval {
    /// Provider payment identifier, stored on the payment row.
    pub payment_id: String,
    /// Provider page to redirect the customer to for approval.
    pub approval_url: String,
}

/// The result of executing an approved wallet payment.
#[derive(Debug, Clone)]
pub struct WalletCapture {
    /// Provider transaction identifier.
    pub transaction_id: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct PaymentResponse {
    id: String,
    state: String,
    #[serde(default)]
    links: Vec<Link>,
    #[serde(default)]
    transactions: Vec<Transaction>,
}

#[derive(Deserialize)]
struct Link {
    href: String,
    rel: String,
}

#[derive(Deserialize)]
struct Transaction {
    #[serde(default)]
    related_resources: Vec<RelatedResource>,
}

#[derive(Deserialize)]
struct RelatedResource {
    sale: Option<Sale>,
}

#[derive(Deserialize)]
struct Sale {
    id: String,
}

impl WalletGateway {
    /// Create a new wallet gateway client.
    #[must_use]
    pub fn new(config: &WalletGatewayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }

    async fn access_token(&self) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(format!("{}/v1/oauth2/token", self.api_base))
            .basic_auth(&self.client_id, Some(self.client_secret.expose_secret()))
            .form(&[("grant_type", "client_credentials")])
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

        Ok(response.json::<TokenResponse>().await?.access_token)
    }

    /// Create a payment for approval.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Malformed` if the provider response carries
    /// no approval link, `Http`/`Api` for transport and provider failures.
    pub async fn create_payment(
        &self,
        amount: Decimal,
        description: &str,
        return_url: &str,
        cancel_url: &str,
    ) -> Result<WalletApproval, GatewayError> {
        let token = self.access_token().await?;

        let body = json!({
            "intent": "sale",
            "payer": { "payment_method": "paypal" },
            "redirect_urls": {
                "return_url": return_url,
                "cancel_url": cancel_url,
            },
            "transactions": [{
                "amount": {
                    "total": format_major_units(amount),
                    "currency": CURRENCY,
                },
                "description": description,
            }],
        });

        let response = self
            .client
            .post(format!("{}/v1/payments/payment", self.api_base))
            .bearer_auth(&token)
            .json(&body)
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

        let payment: PaymentResponse = response.json().await?;
        let approval_url = payment
            .links
            .iter()
            .find(|link| link.rel == "approval_url")
            .map(|link| link.href.clone())
            .ok_or_else(|| {
                GatewayError::Malformed(format!("payment {} has no approval_url", payment.id))
            })?;

        Ok(WalletApproval {
            payment_id: payment.id,
            approval_url,
        })
    }

    /// Execute an approved payment with the payer id from the return
    /// redirect.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Rejected` if the provider did not approve
    /// the payment.
    pub async fn execute_payment(
        &self,
        payment_id: &str,
        payer_id: &str,
    ) -> Result<WalletCapture, GatewayError> {
        let token = self.access_token().await?;

        let response = self
            .client
            .post(format!(
                "{}/v1/payments/payment/{payment_id}/execute",
                self.api_base
            ))
            .bearer_auth(&token)
            .json(&json!({ "payer_id": payer_id }))
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

        let payment: PaymentResponse = response.json().await?;
        if payment.state != "approved" {
            return Err(GatewayError::Rejected(format!(
                "payment {} is {}",
                payment.id, payment.state
            )));
        }

        // Prefer the sale id; fall back to the payment id when the provider
        // omits related resources.
        let transaction_id = payment
            .transactions
            .iter()
            .flat_map(|t| &t.related_resources)
            .filter_map(|r| r.sale.as_ref())
            .map(|sale| sale.id.clone())
            .next()
            .unwrap_or(payment.id);

        Ok(WalletCapture { transaction_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_link_is_extracted_from_links() {
        let body = r#"{
            "id": "PAY-123",
            "state": "created",
            "links": [
                { "href": "https://wallet.test/self", "rel": "self" },
                { "href": "https://wallet.test/approve?token=EC-1", "rel": "approval_url" }
            ]
        }"#;

        let payment: PaymentResponse = serde_json::from_str(body).unwrap();
        let approval = payment.links.iter().find(|l| l.rel == "approval_url");
        assert_eq!(
            approval.map(|l| l.href.as_str()),
            Some("https://wallet.test/approve?token=EC-1")
        );
    }

    #[test]
    fn sale_id_is_preferred_over_payment_id() {
        let body = r#"{
            "id": "PAY-123",
            "state": "approved",
            "transactions": [
                { "related_resources": [ { "sale": { "id": "SALE-789" } } ] }
            ]
        }"#;

        let payment: PaymentResponse = serde_json::from_str(body).unwrap();
        let sale_id = payment
            .transactions
            .iter()
            .flat_map(|t| &t.related_resources)
            .filter_map(|r| r.sale.as_ref())
            .map(|s| s.id.clone())
            .next();
        assert_eq!(sale_id.as_deref(), Some("SALE-789"));
    }
}
