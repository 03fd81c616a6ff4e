//! Catalog models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use winniecho_core::{CategoryId, ProductId, ProductStatus};

/// A product category (single-letter code: D/M/W/A).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub code: String,
    pub name: String,
    pub description: String,
}

/// A chocolate product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Stock level at or below which a product is flagged as low stock.
    pub const LOW_STOCK_THRESHOLD: i32 = 10;

    /// Whether this product can currently be purchased.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self.status, ProductStatus::Active) && self.stock > 0
    }

    /// Whether stock has dropped to the low-stock threshold.
    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.stock > 0 && self.stock <= Self::LOW_STOCK_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winniecho_core::{CategoryId, ProductId};

    fn product(status: ProductStatus, stock: i32) -> Product {
        Product {
            id: ProductId::new(1),
            category_id: CategoryId::new(1),
            name: "70% Dark".to_string(),
            description: String::new(),
            price: Decimal::new(25_90, 2),
            stock,
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn availability_requires_active_status_and_stock() {
        assert!(product(ProductStatus::Active, 5).is_available());
        assert!(!product(ProductStatus::Active, 0).is_available());
        assert!(!product(ProductStatus::Inactive, 5).is_available());
        assert!(!product(ProductStatus::OutOfStock, 5).is_available());
    }
}
