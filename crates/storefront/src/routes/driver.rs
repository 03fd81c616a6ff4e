//! Fulfillment route handlers for staff (admin and driver) accounts.

use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use serde::Deserialize;

use winniecho_core::{OrderId, OrderStatus};

use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireStaff;
use crate::models::order::{DeliveryProof, Order};
use crate::services::fulfillment;
use crate::state::AppState;

/// Accepted proof image extensions.
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Status advance request body.
#[derive(Debug, Deserialize)]
pub struct AdvanceRequest {
    pub status: OrderStatus,
}

/// GET /driver/orders
pub async fn index(
    State(state): State<AppState>,
    RequireStaff(_user): RequireStaff,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_fulfillment()
        .await?;

    Ok(Json(orders))
}

/// POST /driver/orders/{id}/status
pub async fn advance_status(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<OrderId>,
    Json(request): Json<AdvanceRequest>,
) -> Result<Json<Order>> {
    let order = fulfillment::advance(&state, id, request.status).await?;

    tracing::info!(
        order_number = %order.order_number,
        staff_id = %user.id,
        status = %order.status,
        "staff advanced order"
    );

    Ok(Json(order))
}

/// POST /driver/orders/{id}/proof
///
/// Multipart upload with a single `image` field. Marks the order delivered
/// when it was shipped; re-uploads replace the stored image.
pub async fn upload_proof(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    Path(id): Path<OrderId>,
    mut multipart: Multipart,
) -> Result<Json<DeliveryProof>> {
    let mut image: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let extension = field
            .file_name()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .ok_or_else(|| AppError::BadRequest("image filename has no extension".into()))?;

        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(AppError::BadRequest(format!(
                "unsupported image type .{extension}"
            )));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("failed to read image: {e}")))?;

        image = Some((bytes.to_vec(), extension));
    }

    let (bytes, extension) =
        image.ok_or_else(|| AppError::BadRequest("missing image field".into()))?;
    if bytes.is_empty() {
        return Err(AppError::BadRequest("image is empty".into()));
    }

    let proof = fulfillment::attach_proof(&state, id, user.id, &bytes, &extension).await?;

    Ok(Json(proof))
}
