//! Cart models.

use rust_decimal::Decimal;
use serde::Serialize;

use winniecho_core::{CartId, CartItemId, ProductId};

/// A cart line joined with the current product name/price/stock.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Decimal,
    pub stock: i32,
    pub quantity: i32,
}

impl CartLine {
    /// Line total at current catalog price.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Compute the subtotal across cart lines.
#[must_use]
pub fn subtotal(lines: &[CartLine]) -> Decimal {
    lines.iter().map(CartLine::line_total).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price_cents: i64, quantity: i32) -> CartLine {
        CartLine {
            id: CartItemId::new(1),
            cart_id: CartId::new(1),
            product_id: ProductId::new(1),
            product_name: "Praline Box".to_string(),
            unit_price: Decimal::new(price_cents, 2),
            stock: 100,
            quantity,
        }
    }

    #[test]
    fn line_total_multiplies_quantity() {
        assert_eq!(line(12_50, 4).line_total(), Decimal::new(50_00, 2));
    }

    #[test]
    fn subtotal_sums_lines() {
        let lines = vec![line(10_00, 2), line(5_50, 1)];
        assert_eq!(subtotal(&lines), Decimal::new(25_50, 2));
        assert_eq!(subtotal(&[]), Decimal::ZERO);
    }
}
