//! Loyalty rate arithmetic.
//!
//! Rates live here so the checkout preview and the ledger can never
//! disagree:
//!
//! - Earn: every RM 100 paid earns 1 point (`paid / 100`).
//! - Redeem: 1 point is worth RM 0.50 of discount.
//!
//! Points and amounts are both `Decimal` with two fractional digits, as in
//! the member ledger columns.

use rust_decimal::Decimal;

/// Divisor applied to the paid amount to compute points earned.
const EARN_DIVISOR: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

/// Discount value of a single point, in RM.
const POINT_VALUE: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Points earned for a paid amount (post-discount).
#[must_use]
pub fn points_for_spend(amount_paid: Decimal) -> Decimal {
    (amount_paid / EARN_DIVISOR).round_dp(2)
}

/// Discount amount for a number of redeemed points.
#[must_use]
pub fn discount_for_points(points: Decimal) -> Decimal {
    (points * POINT_VALUE).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rm(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn earn_is_one_percent_of_spend() {
        assert_eq!(points_for_spend(rm(100_00)), Decimal::ONE);
        assert_eq!(points_for_spend(rm(95_00)), rm(95));
        assert_eq!(points_for_spend(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn earn_rounds_to_cents() {
        assert_eq!(points_for_spend(rm(33_33)), rm(33));
    }

    #[test]
    fn redeem_is_half_a_ringgit_per_point() {
        assert_eq!(discount_for_points(Decimal::new(10, 0)), rm(5_00));
        assert_eq!(discount_for_points(Decimal::ONE), rm(50));
        assert_eq!(discount_for_points(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn loyalty_round_trip() {
        // redeem(p) then earn(a): balance = initial - p + a/100
        let initial = Decimal::new(50, 0);
        let redeemed = Decimal::new(10, 0);
        let paid = rm(95_00);
        let balance = initial - redeemed + points_for_spend(paid);
        assert_eq!(balance, rm(40_95));
    }
}
