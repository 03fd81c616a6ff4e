//! Payment route handlers.
//!
//! The webhook handler takes the raw body because signature verification
//! runs over the exact bytes the provider signed; parsing happens only
//! after the signature checks out.

use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use winniecho_core::{OrderId, PaymentId, PaymentMethod};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::auth::RequireAuth;
use crate::models::order::Order;
use crate::services::payment::{self, ConfirmOutcome, StartOutcome, WebhookOutcome};
use crate::state::AppState;

/// Header carrying the card provider's webhook signature.
const SIGNATURE_HEADER: &str = "stripe-signature";

/// Payment start request body.
#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub order_id: OrderId,
    pub method: PaymentMethod,
}

/// Payment start response: either a provider redirect or an immediately
/// confirmed cash order.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProcessResponse {
    Redirect { payment_id: PaymentId, url: String },
    Confirmed { order: Order },
}

/// Query parameters for provider return redirects.
#[derive(Debug, Deserialize)]
pub struct ReturnQuery {
    pub payment_id: PaymentId,
    /// Payer id appended by the wallet provider ("PayerID").
    #[serde(rename = "PayerID")]
    pub payer_id: Option<String>,
}

/// POST /payment/process
pub async fn process(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<ProcessRequest>,
) -> Result<Json<ProcessResponse>> {
    add_breadcrumb(
        "payment",
        "payment started",
        Some(&[("method", &request.method.to_string())]),
    );

    let outcome = payment::start(&state, user.id, request.order_id, request.method).await?;

    let response = match outcome {
        StartOutcome::Redirect { payment_id, url } => {
            ProcessResponse::Redirect { payment_id, url }
        }
        StartOutcome::CodConfirmed { order } => ProcessResponse::Confirmed { order },
    };

    Ok(Json(response))
}

/// GET /payment/card/return
pub async fn card_return(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<ReturnQuery>,
) -> Result<Json<serde_json::Value>> {
    let outcome = payment::confirm_card_return(&state, user.id, query.payment_id).await?;

    Ok(Json(confirmation_body(outcome)))
}

/// GET /payment/wallet/return
pub async fn wallet_return(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<ReturnQuery>,
) -> Result<Json<serde_json::Value>> {
    let payer_id = query
        .payer_id
        .ok_or_else(|| AppError::BadRequest("missing PayerID".into()))?;

    let outcome =
        payment::confirm_wallet_return(&state, user.id, query.payment_id, &payer_id).await?;

    Ok(Json(confirmation_body(outcome)))
}

/// GET /payment/cancel
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<ReturnQuery>,
) -> Result<Json<serde_json::Value>> {
    payment::cancel(&state, user.id, query.payment_id).await?;

    Ok(Json(json!({ "status": "cancelled" })))
}

/// POST /payment/webhook
///
/// Unauthenticated: trust comes from the signature, not a session.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<serde_json::Value>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("missing signature header".into()))?;

    let outcome = payment::confirm_webhook(&state, &body, signature).await?;

    let status = match outcome {
        WebhookOutcome::Finalized => "finalized",
        WebhookOutcome::AlreadySettled => "already_settled",
        WebhookOutcome::Ignored => "ignored",
    };
    Ok(Json(json!({ "status": status })))
}

fn confirmation_body(outcome: ConfirmOutcome) -> serde_json::Value {
    match outcome {
        ConfirmOutcome::Finalized => json!({ "status": "paid" }),
        ConfirmOutcome::AlreadySettled => json!({ "status": "already_settled" }),
    }
}
