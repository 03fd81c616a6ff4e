//! Card gateway webhook verification, end to end against the public
//! client API: sign a payload the way the provider does, hand it to a
//! constructed `CardGateway`, and check what comes out.

use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use sha2::Sha256;

use winniecho_integration_tests::{rm, test_card_gateway_config};
use winniecho_storefront::services::gateway::{
    CardGateway, GatewayError, format_major_units, to_minor_units,
};

const SECRET: &str = "whsec_integration_test";

fn provider_signature(secret: &str, timestamp: &str, payload: &str) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn signed_header(payload: &str) -> String {
    let timestamp = "1724380000";
    let signature = provider_signature(SECRET, timestamp, payload);
    format!("t={timestamp},v1={signature}")
}

#[test]
fn completed_session_webhook_round_trips() {
    let gateway = CardGateway::new(&test_card_gateway_config(SECRET));
    let payload = r#"{
        "type": "checkout.session.completed",
        "data": { "object": { "id": "cs_live_777", "payment_intent": "pi_888" } }
    }"#;

    let event = gateway
        .verify_webhook(payload, &signed_header(payload))
        .expect("verified event");

    assert_eq!(event.event_type, "checkout.session.completed");
    assert_eq!(event.data.object.id, "cs_live_777");
    assert_eq!(event.data.object.payment_intent.as_deref(), Some("pi_888"));
}

/// Events without a payment intent still parse; the handler falls back
/// to the session id as the transaction reference.
#[test]
fn webhook_without_payment_intent_parses() {
    let gateway = CardGateway::new(&test_card_gateway_config(SECRET));
    let payload = r#"{"type":"checkout.session.expired","data":{"object":{"id":"cs_9"}}}"#;

    let event = gateway
        .verify_webhook(payload, &signed_header(payload))
        .expect("verified event");

    assert_eq!(event.event_type, "checkout.session.expired");
    assert!(event.data.object.payment_intent.is_none());
}

#[test]
fn tampered_payload_is_rejected_before_parsing() {
    let gateway = CardGateway::new(&test_card_gateway_config(SECRET));
    let header = signed_header(r#"{"type":"checkout.session.completed"}"#);

    let result = gateway.verify_webhook(r#"{"type":"anything.else"}"#, &header);
    assert!(matches!(result, Err(GatewayError::Rejected(_))));
}

#[test]
fn signature_from_another_secret_is_rejected() {
    let gateway = CardGateway::new(&test_card_gateway_config(SECRET));
    let payload = r#"{"type":"checkout.session.completed"}"#;
    let signature = provider_signature("whsec_someone_else", "1724380000", payload);

    let result = gateway.verify_webhook(payload, &format!("t=1724380000,v1={signature}"));
    assert!(matches!(result, Err(GatewayError::Rejected(_))));
}

#[test]
fn garbled_signature_headers_are_malformed() {
    let gateway = CardGateway::new(&test_card_gateway_config(SECRET));
    let payload = r#"{"type":"checkout.session.completed"}"#;

    for header in ["", "t=123", "v1=deadbeef", "nonsense"] {
        let result = gateway.verify_webhook(payload, header);
        assert!(
            matches!(result, Err(GatewayError::Malformed(_))),
            "header {header:?}"
        );
    }
}

#[test]
fn valid_signature_over_invalid_json_is_malformed() {
    let gateway = CardGateway::new(&test_card_gateway_config(SECRET));
    let payload = "not json at all";

    let result = gateway.verify_webhook(payload, &signed_header(payload));
    assert!(matches!(result, Err(GatewayError::Malformed(_))));
}

/// Charge amounts move to the card provider in sen and to the wallet
/// provider as two-decimal strings; both views of RM 85.00 agree.
#[test]
fn charge_amount_representations_agree() {
    let amount = rm(85_00);

    assert_eq!(to_minor_units(amount).expect("minor units"), 8500);
    assert_eq!(format_major_units(amount), "85.00");

    assert_eq!(to_minor_units(Decimal::ZERO).expect("zero"), 0);
    assert_eq!(format_major_units(Decimal::ZERO), "0.00");
}
