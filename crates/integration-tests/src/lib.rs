//! Cross-crate scenario tests for WinnieCho.
//!
//! These tests exercise the public surface of `winniecho-core` and
//! `winniecho-storefront` together: the order and payment state machines,
//! checkout pricing with loyalty redemption, and gateway webhook
//! verification. They run without a database; repository behavior that
//! needs Postgres (conditional updates, constraint interplay) is covered
//! by the schema's own checks and the per-crate unit tests.
//!
//! ```bash
//! cargo test -p winniecho-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use rust_decimal::Decimal;
use secrecy::SecretString;

use winniecho_storefront::config::CardGatewayConfig;

/// Ringgit amount from sen, e.g. `rm(9500)` is RM 95.00.
#[must_use]
pub fn rm(sen: i64) -> Decimal {
    Decimal::new(sen, 2)
}

/// A card gateway config pointed at nothing, for offline verification
/// tests (webhook signatures never touch the network).
#[must_use]
pub fn test_card_gateway_config(webhook_secret: &str) -> CardGatewayConfig {
    CardGatewayConfig {
        api_base: "http://127.0.0.1:9".to_string(),
        secret_key: SecretString::from("sk_test_offline"),
        webhook_secret: SecretString::from(webhook_secret),
    }
}
