//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use winniecho_core::ProductId;

use crate::db::products::{ProductFilter, ProductRepository, ProductSort};
use crate::error::{AppError, Result};
use crate::models::product::{Category, Product};
use crate::state::AppState;

/// Query parameters for product listing.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Single-letter category code.
    pub category: Option<String>,
    /// Search term matched against name and description.
    pub q: Option<String>,
    pub sort: Option<String>,
}

/// Catalog product with availability flags folded in.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: Product,
    pub available: bool,
    pub low_stock: bool,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        let available = product.is_available();
        let low_stock = product.is_low_stock();
        Self {
            product,
            available,
            low_stock,
        }
    }
}

fn parse_sort(sort: Option<&str>) -> ProductSort {
    match sort {
        Some("price_asc") => ProductSort::PriceLowToHigh,
        Some("price_desc") => ProductSort::PriceHighToLow,
        Some("newest") => ProductSort::Newest,
        _ => ProductSort::Name,
    }
}

/// GET /products
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ProductResponse>>> {
    let filter = ProductFilter {
        category_code: query.category,
        search: query.q,
        sort: parse_sort(query.sort.as_deref()),
    };

    let products = ProductRepository::new(state.pool())
        .list_active(&filter)
        .await?;

    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// GET /products/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductResponse>> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(Json(product.into()))
}

/// GET /categories
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = ProductRepository::new(state.pool()).categories().await?;
    Ok(Json(categories))
}
