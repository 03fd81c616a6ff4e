//! Status enums for catalog, orders, payments, and users.
//!
//! The original data carried these as single-character string codes; here
//! they are closed enums with exhaustive-match transition logic so invalid
//! states are unrepresentable.

use serde::{Deserialize, Serialize};

/// Product availability status.
///
/// `OutOfStock` is derived by the stock-mutating repository operations
/// (stock reaching zero sets it, restocking clears it), but operators may
/// also set status directly, so `OutOfStock ⇔ stock = 0` is not a global
/// invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "product_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Inactive,
    #[default]
    Active,
    OutOfStock,
}

/// Order lifecycle status.
///
/// A strictly forward-moving machine, except for the `Cancelled` escape
/// hatch reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether no further transitions are allowed from this state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether the machine may move from `self` to `to`.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        match (self, to) {
            (Self::Pending, Self::Confirmed)
            | (Self::Confirmed, Self::Shipped)
            | (Self::Shipped, Self::Delivered) => true,
            (from, Self::Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Human-readable message sent to the customer when this state is reached.
    #[must_use]
    pub const fn customer_message(self) -> &'static str {
        match self {
            Self::Pending => "Your order has been received and is awaiting payment.",
            Self::Confirmed => "Your order is confirmed and being prepared.",
            Self::Shipped => "Your order is on its way.",
            Self::Delivered => "Your order has been delivered. Enjoy!",
            Self::Cancelled => "Your order has been cancelled.",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Shipped => write!(f, "shipped"),
            Self::Delivered => write!(f, "delivered"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Payment attempt status.
///
/// `CashPending` marks a cash-on-delivery order awaiting physical
/// collection; it is "confirmed enough" to award loyalty points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Success,
    Failed,
    Cancelled,
    CashPending,
}

impl PaymentStatus {
    /// Whether this attempt can still be confirmed by a gateway callback.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Payment method selected by the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Wallet,
    CashOnDelivery,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Card => write!(f, "card"),
            Self::Wallet => write!(f, "wallet"),
            Self::CashOnDelivery => write!(f, "cash_on_delivery"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "wallet" => Ok(Self::Wallet),
            "cash_on_delivery" => Ok(Self::CashOnDelivery),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// User role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular customer with a loyalty profile.
    #[default]
    Member,
    /// Store staff with full access.
    Admin,
    /// Delivery driver; may advance fulfillment and upload proof.
    Driver,
}

impl UserRole {
    /// Staff roles may drive the fulfillment state machine.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Admin | Self::Driver)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Member => write!(f, "member"),
            Self::Admin => write!(f, "admin"),
            Self::Driver => write!(f, "driver"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(Self::Member),
            "admin" => Ok(Self::Admin),
            "driver" => Ok(Self::Driver),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ORDER_STATUSES: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    #[test]
    fn forward_transitions_allowed() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn cancel_reachable_from_non_terminal_only() {
        for from in ALL_ORDER_STATUSES {
            assert_eq!(
                from.can_transition_to(OrderStatus::Cancelled),
                !from.is_terminal(),
                "cancel from {from}"
            );
        }
    }

    #[test]
    fn no_backward_or_skipping_transitions() {
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Confirmed));
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for to in ALL_ORDER_STATUSES {
            assert!(!OrderStatus::Delivered.can_transition_to(to), "delivered -> {to}");
            assert!(!OrderStatus::Cancelled.can_transition_to(to), "cancelled -> {to}");
        }
    }

    #[test]
    fn order_status_string_roundtrip() {
        for status in ALL_ORDER_STATUSES {
            let parsed: OrderStatus = status.to_string().parse().expect("parse");
            assert_eq!(parsed, status);
        }
        assert!("unknown".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn only_pending_payments_are_open() {
        assert!(PaymentStatus::Pending.is_open());
        assert!(!PaymentStatus::Success.is_open());
        assert!(!PaymentStatus::Failed.is_open());
        assert!(!PaymentStatus::Cancelled.is_open());
        assert!(!PaymentStatus::CashPending.is_open());
    }

    #[test]
    fn staff_roles() {
        assert!(UserRole::Admin.is_staff());
        assert!(UserRole::Driver.is_staff());
        assert!(!UserRole::Member.is_staff());
    }

    #[test]
    fn payment_method_string_roundtrip() {
        for method in [
            PaymentMethod::Card,
            PaymentMethod::Wallet,
            PaymentMethod::CashOnDelivery,
        ] {
            let parsed: PaymentMethod = method.to_string().parse().expect("parse");
            assert_eq!(parsed, method);
        }
    }
}
