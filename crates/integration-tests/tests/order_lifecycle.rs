//! Order state machine scenarios.
//!
//! Walks the lifecycles the handlers drive: online payment, cash on
//! delivery, and cancellation, plus an exhaustive check that the
//! transition table admits exactly the documented moves.

use chrono::{TimeZone, Utc};

use winniecho_core::{OrderNumber, OrderStatus, PaymentStatus};

const ALL: [OrderStatus; 5] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
];

/// Card and wallet orders: checkout leaves the order pending, a gateway
/// confirmation moves it to confirmed, and drivers walk it to delivered.
#[test]
fn online_payment_lifecycle() {
    let path = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ];

    for pair in path.windows(2) {
        assert!(
            pair[0].can_transition_to(pair[1]),
            "{} -> {} must be allowed",
            pair[0],
            pair[1]
        );
    }

    assert!(path[3].is_terminal());
}

/// COD orders confirm immediately at checkout; the payment row stays
/// open as cash-pending until the driver marks the order delivered.
#[test]
fn cash_on_delivery_lifecycle() {
    assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));

    // Cash-pending is not an open gateway attempt: webhooks must not be
    // able to settle it, only the delivery handoff does.
    assert!(!PaymentStatus::CashPending.is_open());
    assert!(PaymentStatus::Pending.is_open());
}

/// An order can be cancelled at any point before it is delivered, and
/// never after.
#[test]
fn cancellation_window() {
    for from in [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
    ] {
        assert!(from.can_transition_to(OrderStatus::Cancelled), "cancel from {from}");
    }

    assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
    assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Cancelled));
}

/// The transition table admits exactly the forward chain plus the
/// cancellation escape, nothing else.
#[test]
fn transition_table_is_exact() {
    let allowed = |from: OrderStatus, to: OrderStatus| match (from, to) {
        (OrderStatus::Pending, OrderStatus::Confirmed)
        | (OrderStatus::Confirmed, OrderStatus::Shipped)
        | (OrderStatus::Shipped, OrderStatus::Delivered) => true,
        (from, OrderStatus::Cancelled) => !from.is_terminal(),
        _ => false,
    };

    for from in ALL {
        for to in ALL {
            assert_eq!(
                from.can_transition_to(to),
                allowed(from, to),
                "{from} -> {to}"
            );
        }
    }
}

/// Every state carries a distinct customer-facing message.
#[test]
fn customer_messages_are_distinct() {
    for (i, a) in ALL.iter().enumerate() {
        assert!(!a.customer_message().is_empty());
        for b in ALL.iter().skip(i + 1) {
            assert_ne!(a.customer_message(), b.customer_message());
        }
    }
}

/// Order numbers embed the creation timestamp behind a fixed prefix.
#[test]
fn order_numbers_are_prefixed_timestamps() {
    let ts = Utc
        .with_ymd_and_hms(2026, 8, 23, 9, 30, 0)
        .single()
        .expect("valid timestamp");
    let number = OrderNumber::generate_at(ts);

    assert!(number.as_str().starts_with("CHO20260823093000"));
    assert_eq!(number.as_str().len(), "CHO".len() + 14 + 4);
}

/// Two orders placed in the same second still get distinct numbers
/// almost always; the database unique index catches the rare collision.
#[test]
fn order_numbers_vary_within_a_second() {
    let ts = Utc
        .with_ymd_and_hms(2026, 8, 23, 9, 30, 0)
        .single()
        .expect("valid timestamp");

    let numbers: Vec<String> = (0..32)
        .map(|_| OrderNumber::generate_at(ts).as_str().to_string())
        .collect();

    let distinct: std::collections::HashSet<&String> = numbers.iter().collect();
    assert!(distinct.len() > 1, "suffix should be random");
}
