//! Cart route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use winniecho_core::{CartItemId, ProductId};

use crate::db::carts::CartRepository;
use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireAuth;
use crate::models::cart::{self, CartLine};
use crate::state::AppState;

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Quantity-update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

/// Cart contents with the subtotal folded in.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub lines: Vec<CartLine>,
    pub subtotal: Decimal,
}

/// GET /cart
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartResponse>> {
    let lines = CartRepository::new(state.pool())
        .lines_for_user(user.id)
        .await?;
    let subtotal = cart::subtotal(&lines);

    Ok(Json(CartResponse { lines, subtotal }))
}

/// POST /cart/items
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<AddItemRequest>,
) -> Result<Json<CartResponse>> {
    if request.quantity < 1 {
        return Err(AppError::BadRequest("quantity must be at least 1".into()));
    }

    let product = ProductRepository::new(state.pool())
        .get(request.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", request.product_id)))?;

    if !product.is_available() {
        return Err(AppError::BadRequest(format!(
            "{} is not available",
            product.name
        )));
    }
    if request.quantity > product.stock {
        return Err(AppError::BadRequest(format!(
            "only {} of {} in stock",
            product.stock, product.name
        )));
    }

    let repo = CartRepository::new(state.pool());
    repo.add_item(user.id, request.product_id, request.quantity)
        .await?;

    let lines = repo.lines_for_user(user.id).await?;
    let subtotal = cart::subtotal(&lines);
    Ok(Json(CartResponse { lines, subtotal }))
}

/// What a requested quantity means for the cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuantityChange {
    /// Zero takes the line out of the cart.
    Remove,
    /// A positive quantity within stock replaces the line's quantity.
    Set(i32),
    Negative,
    ExceedsStock,
}

const fn classify_quantity(quantity: i32, stock: i32) -> QuantityChange {
    if quantity < 0 {
        QuantityChange::Negative
    } else if quantity == 0 {
        QuantityChange::Remove
    } else if quantity > stock {
        QuantityChange::ExceedsStock
    } else {
        QuantityChange::Set(quantity)
    }
}

/// PUT /cart/items/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<CartItemId>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Json<CartResponse>> {
    let repo = CartRepository::new(state.pool());
    let line = repo
        .get_line(user.id, item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("cart item {item_id}")))?;

    match classify_quantity(request.quantity, line.stock) {
        QuantityChange::Negative => {
            return Err(AppError::BadRequest("quantity cannot be negative".into()));
        }
        QuantityChange::ExceedsStock => {
            return Err(AppError::BadRequest(format!(
                "only {} of {} in stock",
                line.stock, line.product_name
            )));
        }
        QuantityChange::Remove => {
            repo.remove_item(user.id, item_id).await?;
        }
        QuantityChange::Set(quantity) => {
            repo.set_quantity(user.id, item_id, quantity).await?;
        }
    }

    let lines = repo.lines_for_user(user.id).await?;
    let subtotal = cart::subtotal(&lines);
    Ok(Json(CartResponse { lines, subtotal }))
}

/// DELETE /cart
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<serde_json::Value>> {
    crate::db::carts::clear_for_user(state.pool(), user.id).await?;

    Ok(Json(json!({ "ok": true })))
}

/// DELETE /cart/items/{id}
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(item_id): Path<CartItemId>,
) -> Result<Json<serde_json::Value>> {
    let removed = CartRepository::new(state.pool())
        .remove_item(user.id, item_id)
        .await?;
    if !removed {
        return Err(AppError::NotFound(format!("cart item {item_id}")));
    }

    Ok(Json(json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_quantity_removes_the_line() {
        assert_eq!(classify_quantity(0, 10), QuantityChange::Remove);
    }

    #[test]
    fn negative_quantity_is_rejected() {
        assert_eq!(classify_quantity(-1, 10), QuantityChange::Negative);
    }

    #[test]
    fn quantity_is_capped_at_stock() {
        assert_eq!(classify_quantity(11, 10), QuantityChange::ExceedsStock);
        assert_eq!(classify_quantity(10, 10), QuantityChange::Set(10));
        assert_eq!(classify_quantity(1, 10), QuantityChange::Set(1));
    }

    #[test]
    fn sold_out_products_admit_no_positive_quantity() {
        assert_eq!(classify_quantity(1, 0), QuantityChange::ExceedsStock);
        assert_eq!(classify_quantity(0, 0), QuantityChange::Remove);
    }
}
