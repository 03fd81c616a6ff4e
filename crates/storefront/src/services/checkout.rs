//! Checkout: turn a cart into a pending order.
//!
//! The whole placement runs in one transaction: redeem loyalty points,
//! create the order, snapshot each cart line, and decrement stock. Any
//! failed guard rolls the lot back, so points are never burned against an
//! order that did not materialize. The cart itself is left intact until a
//! payment actually succeeds, so an abandoned payment keeps the cart
//! recoverable.

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use winniecho_core::{AddressId, UserId, discount_for_points};

use crate::db::addresses::AddressRepository;
use crate::db::carts::CartRepository;
use crate::db::{RepositoryError, members, orders, products};
use crate::models::cart;
use crate::models::order::Order;

/// Errors that can reject a checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Cart has no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// A line's quantity exceeds the product's current stock.
    #[error("not enough stock for {product}")]
    QuantityExceedsStock { product: String },

    /// Redemption request is negative or otherwise nonsensical.
    #[error("invalid loyalty points amount")]
    InvalidPointsAmount,

    /// Member balance does not cover the requested redemption.
    #[error("not enough loyalty points")]
    InsufficientPoints,

    /// Requested redemption is worth more than the order subtotal.
    #[error("discount exceeds order total")]
    DiscountExceedsTotal,

    /// Delivery address missing or not owned by the buyer.
    #[error("address not found")]
    AddressNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// What to place and where to deliver it.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub address_id: AddressId,
    /// Loyalty points to redeem against the subtotal. Zero for none.
    pub redeem_points: Decimal,
}

/// The money shape of a checkout, computed before anything is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    /// Sum of line totals before discount.
    pub subtotal: Decimal,
    /// Discount value of the redeemed points.
    pub discount: Decimal,
    /// Amount the payment will charge.
    pub total: Decimal,
}

/// A successfully placed (pending) order.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    pub totals: Totals,
}

/// Compute checkout totals from a subtotal and a points redemption.
///
/// # Errors
///
/// Returns `InvalidPointsAmount` for negative redemptions and
/// `DiscountExceedsTotal` when the discount would push the total below
/// zero.
pub fn compute_totals(subtotal: Decimal, redeem_points: Decimal) -> Result<Totals, CheckoutError> {
    if redeem_points.is_sign_negative() {
        return Err(CheckoutError::InvalidPointsAmount);
    }

    let discount = discount_for_points(redeem_points);
    if discount > subtotal {
        return Err(CheckoutError::DiscountExceedsTotal);
    }

    Ok(Totals {
        subtotal,
        discount,
        total: subtotal - discount,
    })
}

/// Place an order from the user's cart.
///
/// # Errors
///
/// Returns a `CheckoutError` describing the first failed guard; nothing
/// is persisted in that case.
pub async fn place_order(
    pool: &PgPool,
    user_id: UserId,
    request: &CheckoutRequest,
) -> Result<PlacedOrder, CheckoutError> {
    let lines = CartRepository::new(pool).lines_for_user(user_id).await?;
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let address = AddressRepository::new(pool)
        .get_owned(request.address_id, user_id)
        .await?
        .ok_or(CheckoutError::AddressNotFound)?;

    let subtotal = cart::subtotal(&lines);
    let totals = compute_totals(subtotal, request.redeem_points)?;

    let mut tx = pool.begin().await.map_err(RepositoryError::from)?;

    if request.redeem_points > Decimal::ZERO {
        let redeemed = members::redeem(&mut *tx, user_id, request.redeem_points).await?;
        if !redeemed {
            return Err(CheckoutError::InsufficientPoints);
        }
    }

    let order = orders::create(&mut *tx, address.id, subtotal, request.redeem_points).await?;

    for line in &lines {
        let decremented =
            products::decrement_stock(&mut *tx, line.product_id, line.quantity).await?;
        if !decremented {
            return Err(CheckoutError::QuantityExceedsStock {
                product: line.product_name.clone(),
            });
        }

        orders::insert_item(
            &mut *tx,
            order.id,
            line.product_id,
            &line.product_name,
            line.unit_price,
            line.quantity,
            line.line_total(),
        )
        .await?;
    }

    tx.commit().await.map_err(RepositoryError::from)?;

    tracing::info!(
        order_number = %order.order_number,
        subtotal = %totals.subtotal,
        discount = %totals.discount,
        "order placed"
    );

    Ok(PlacedOrder { order, totals })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rm(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn totals_without_redemption() {
        let totals = compute_totals(rm(9500), Decimal::ZERO).unwrap();
        assert_eq!(totals.subtotal, rm(9500));
        assert_eq!(totals.discount, Decimal::ZERO);
        assert_eq!(totals.total, rm(9500));
    }

    #[test]
    fn ten_points_knock_off_five_ringgit() {
        let totals = compute_totals(rm(9500), Decimal::from(10)).unwrap();
        assert_eq!(totals.discount, rm(500));
        assert_eq!(totals.total, rm(9000));
    }

    #[test]
    fn discount_may_equal_the_subtotal() {
        // 190 points at RM0.50 each exactly covers RM95.00.
        let totals = compute_totals(rm(9500), Decimal::from(190)).unwrap();
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn discount_beyond_subtotal_is_rejected() {
        let result = compute_totals(rm(9500), Decimal::from(191));
        assert!(matches!(result, Err(CheckoutError::DiscountExceedsTotal)));
    }

    #[test]
    fn negative_redemption_is_rejected() {
        let result = compute_totals(rm(9500), Decimal::from(-1));
        assert!(matches!(result, Err(CheckoutError::InvalidPointsAmount)));
    }
}
