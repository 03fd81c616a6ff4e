//! Manual restocking.

use winniecho_core::ProductId;
use winniecho_storefront::db::products::ProductRepository;

use super::{CommandError, connect};

/// Add stock to a product. Products that sold out come back as active.
///
/// # Errors
///
/// Returns an error if the quantity is not positive, the product does not
/// exist, or the database is unreachable.
pub async fn run(product_id: i32, quantity: i32) -> Result<(), CommandError> {
    if quantity <= 0 {
        return Err(CommandError::InvalidArgument(
            "quantity must be positive".to_string(),
        ));
    }

    let pool = connect().await?;
    let repo = ProductRepository::new(&pool);
    let product_id = ProductId::new(product_id);

    let product = repo
        .get(product_id)
        .await
        .map_err(|e| CommandError::Other(e.to_string()))?
        .ok_or_else(|| CommandError::InvalidArgument(format!("no product {product_id}")))?;

    repo.restock(product_id, quantity)
        .await
        .map_err(|e| CommandError::Other(e.to_string()))?;

    tracing::info!(
        "Restocked '{}': {} -> {} units",
        product.name,
        product.stock,
        product.stock + quantity
    );
    Ok(())
}
