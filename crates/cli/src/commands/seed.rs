//! Demo catalog seeding.
//!
//! Inserts the four chocolate categories and a handful of products so a
//! fresh database has something to sell. Safe to re-run: categories
//! upsert on their code and products are skipped when a product with the
//! same name already exists.

use rust_decimal::Decimal;
use sqlx::PgPool;

use super::{CommandError, connect};

/// Category code, name, description.
const CATEGORIES: &[(&str, &str, &str)] = &[
    ("D", "Dark", "Single-origin dark chocolate, 60% cocoa and up"),
    ("M", "Milk", "Classic milk chocolate bars and pralines"),
    ("W", "White", "White chocolate and blond caramelised ranges"),
    ("A", "Assorted", "Mixed boxes and gift selections"),
];

/// Category code, product name, description, price in sen, stock.
const PRODUCTS: &[(&str, &str, &str, i64, i32)] = &[
    (
        "D",
        "72% Single Origin Bar",
        "Bean-to-bar dark chocolate from Pahang cocoa",
        1890,
        40,
    ),
    (
        "D",
        "Dark Sea Salt Thins",
        "Thin dark chocolate squares with flaked sea salt",
        2450,
        25,
    ),
    (
        "M",
        "Milk Hazelnut Bar",
        "Creamy milk chocolate with roasted hazelnuts",
        1590,
        60,
    ),
    (
        "M",
        "Gula Melaka Pralines",
        "Milk chocolate pralines with palm sugar caramel",
        3200,
        18,
    ),
    (
        "W",
        "White Pandan Bar",
        "White chocolate infused with pandan",
        1790,
        30,
    ),
    (
        "A",
        "Signature Gift Box (12pc)",
        "A dozen assorted bonbons in a gift box",
        5800,
        12,
    ),
];

/// Seed the catalog with demo data.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    seed_categories(&pool).await?;
    seed_products(&pool).await?;

    tracing::info!("Seeding complete");
    Ok(())
}

async fn seed_categories(pool: &PgPool) -> Result<(), CommandError> {
    for (code, name, description) in CATEGORIES {
        sqlx::query(
            "INSERT INTO categories (code, name, description)
             VALUES ($1, $2, $3)
             ON CONFLICT (code) DO NOTHING",
        )
        .bind(code)
        .bind(name)
        .bind(description)
        .execute(pool)
        .await?;
    }

    tracing::info!("Seeded {} categories", CATEGORIES.len());
    Ok(())
}

async fn seed_products(pool: &PgPool) -> Result<(), CommandError> {
    let mut inserted = 0_u64;

    for (code, name, description, price_sen, stock) in PRODUCTS {
        let price = Decimal::new(*price_sen, 2);

        let result = sqlx::query(
            "INSERT INTO products (category_id, name, description, price, stock)
             SELECT c.id, $2, $3, $4, $5
             FROM categories c
             WHERE c.code = $1
               AND NOT EXISTS (SELECT 1 FROM products p WHERE p.name = $2)",
        )
        .bind(code)
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(stock)
        .execute(pool)
        .await?;

        inserted += result.rows_affected();
    }

    tracing::info!("Seeded {inserted} products ({} defined)", PRODUCTS.len());
    Ok(())
}
