//! Checkout pricing and loyalty scenarios.
//!
//! The preview (`compute_totals`) and the ledger rates
//! (`points_for_spend` / `discount_for_points`) must agree; these
//! scenarios walk a member through several orders and check the balance
//! arithmetic end to end.

use rust_decimal::Decimal;

use winniecho_core::{discount_for_points, points_for_spend};
use winniecho_integration_tests::rm;
use winniecho_storefront::services::checkout::{CheckoutError, compute_totals};

/// First order, no points to spend: pay full price, earn 1% back.
#[test]
fn first_order_earns_points() {
    let totals = compute_totals(rm(185_00), Decimal::ZERO).expect("totals");
    assert_eq!(totals.total, rm(185_00));

    let earned = points_for_spend(totals.total);
    assert_eq!(earned, rm(1_85));
}

/// Second order redeems the earned points; earning applies to the
/// discounted amount actually paid, not the subtotal.
#[test]
fn redemption_reduces_both_charge_and_earning() {
    let balance = Decimal::from(20);

    let totals = compute_totals(rm(95_00), balance).expect("totals");
    assert_eq!(totals.discount, rm(10_00));
    assert_eq!(totals.total, rm(85_00));

    let earned = points_for_spend(totals.total);
    assert_eq!(earned, rm(85));

    // Balance after settlement: spent all 20, earned 0.85.
    let after = balance - balance + earned;
    assert_eq!(after, rm(85));
}

/// A running balance across three orders.
#[test]
fn balance_accumulates_across_orders() {
    let mut balance = Decimal::ZERO;

    for (subtotal, redeem) in [(rm(120_00), 0_i64), (rm(60_00), 1), (rm(200_00), 0)] {
        let redeem = Decimal::from(redeem);
        let totals = compute_totals(subtotal, redeem).expect("totals");
        balance = balance - redeem + points_for_spend(totals.total);
    }

    // 1.20, then (60 - 0.50) / 100 = 0.595 -> 0.60, then 2.00.
    assert_eq!(balance, rm(1_20) - Decimal::ONE + rm(60) + rm(2_00));
}

/// The preview discount is exactly the ledger's valuation of the points.
#[test]
fn preview_matches_ledger_valuation() {
    for points in [1_i64, 7, 50, 190] {
        let points = Decimal::from(points);
        let totals = compute_totals(rm(95_00), points).expect("totals");
        assert_eq!(totals.discount, discount_for_points(points));
        assert_eq!(totals.total, totals.subtotal - totals.discount);
    }
}

/// Points may cover the whole order but never push the total negative.
#[test]
fn redemption_bounds() {
    let exact = compute_totals(rm(95_00), Decimal::from(190)).expect("totals");
    assert_eq!(exact.total, Decimal::ZERO);

    assert!(matches!(
        compute_totals(rm(95_00), Decimal::from(191)),
        Err(CheckoutError::DiscountExceedsTotal)
    ));

    assert!(matches!(
        compute_totals(rm(95_00), Decimal::from(-5)),
        Err(CheckoutError::InvalidPointsAmount)
    ));
}

/// Fractional point balances (earned sen-by-sen) redeem cleanly.
#[test]
fn fractional_points_redeem_to_cents() {
    // 1.85 points at RM 0.50 each is RM 0.925; banker's rounding to
    // two places gives RM 0.92.
    let totals = compute_totals(rm(40_00), rm(1_85)).expect("totals");
    assert_eq!(totals.discount, rm(92));
    assert_eq!(totals.total, rm(39_08));
}
