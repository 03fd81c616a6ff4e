//! Member loyalty profile.

use rust_decimal::Decimal;
use serde::Serialize;

use winniecho_core::{UserId, discount_for_points};

/// Loyalty profile attached one-to-one to a member user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Member {
    pub user_id: UserId,
    /// Current redeemable balance (≥ 0).
    pub loyalty_points: Decimal,
    /// Lifetime paid total; monotonic non-decreasing.
    pub total_spent: Decimal,
}

impl Member {
    /// Monetary value of the current balance at the redeem rate.
    #[must_use]
    pub fn points_value(&self) -> Decimal {
        discount_for_points(self.loyalty_points)
    }
}
