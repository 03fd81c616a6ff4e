//! Payment gateway clients.
//!
//! Two external providers are supported: a card provider with a hosted
//! checkout page (`CardGateway`) and a wallet provider with a redirect
//! approval flow (`WalletGateway`). Both clients speak plain reqwest and
//! normalize provider responses into small structs; everything the domain
//! does not need stays in the opaque `details` blob on the payment row.

mod card;
mod wallet;

pub use card::{CardGateway, CardSession, CardSessionRequest, WebhookEvent, EVENT_CHECKOUT_COMPLETED};
pub use wallet::{WalletApproval, WalletCapture, WalletGateway};

use rust_decimal::Decimal;
use thiserror::Error;

/// Currency for all charges. Prices are stored in Malaysian Ringgit.
pub const CURRENCY: &str = "MYR";

/// Errors from gateway interactions.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned an error response.
    #[error("gateway API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Provider rejected the charge (declined, not approved).
    #[error("payment rejected: {0}")]
    Rejected(String),

    /// Provider response was missing an expected field.
    #[error("malformed gateway response: {0}")]
    Malformed(String),

    /// Amount cannot be represented for the provider.
    #[error("invalid amount: {0}")]
    Amount(String),
}

/// Convert a major-unit decimal amount to provider minor units (sen).
///
/// # Errors
///
/// Returns `GatewayError::Amount` if the amount is negative or carries
/// sub-sen precision.
pub fn to_minor_units(amount: Decimal) -> Result<i64, GatewayError> {
    if amount.is_sign_negative() {
        return Err(GatewayError::Amount(format!("negative amount {amount}")));
    }

    let minor = amount * Decimal::from(100);
    if minor.fract() != Decimal::ZERO {
        return Err(GatewayError::Amount(format!(
            "amount {amount} has sub-sen precision"
        )));
    }

    minor
        .try_into()
        .map_err(|_| GatewayError::Amount(format!("amount {amount} out of range")))
}

/// Format a major-unit amount with exactly two decimal places, as the
/// wallet provider's API requires ("95.00", never "95" or "95.0").
#[must_use]
pub fn format_major_units(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_amounts_convert_to_minor_units() {
        assert_eq!(to_minor_units(Decimal::from(95)).unwrap(), 9500);
        assert_eq!(to_minor_units(Decimal::new(1850, 2)).unwrap(), 1850);
        assert_eq!(to_minor_units(Decimal::ZERO).unwrap(), 0);
    }

    #[test]
    fn sub_sen_precision_is_rejected() {
        let amount = Decimal::new(12345, 3); // 12.345
        assert!(matches!(
            to_minor_units(amount),
            Err(GatewayError::Amount(_))
        ));
    }

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(matches!(
            to_minor_units(Decimal::from(-1)),
            Err(GatewayError::Amount(_))
        ));
    }

    #[test]
    fn major_units_always_carry_two_decimals() {
        assert_eq!(format_major_units(Decimal::from(95)), "95.00");
        assert_eq!(format_major_units(Decimal::new(950, 1)), "95.00");
        assert_eq!(format_major_units(Decimal::new(1234, 2)), "12.34");
    }
}
