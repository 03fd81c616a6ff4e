//! Payment orchestration.
//!
//! Three methods share one finalization path. Card and wallet payments
//! redirect the customer to the provider and settle on return or webhook,
//! whichever lands first; cash-on-delivery settles immediately at order
//! time and the cash itself is collected at the door. Finalization is
//! guarded twice: the payment row's success claim (one winner per payment)
//! and the order's Pending -> Confirmed transition (one settlement per
//! order). Whoever loses either guard observes "already settled" and does
//! nothing.

use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;

use winniecho_core::{
    OrderId, OrderStatus, PaymentId, PaymentMethod, PaymentStatus, UserId, discount_for_points,
    points_for_spend,
};

use crate::db::orders::OrderRepository;
use crate::db::payments::PaymentRepository;
use crate::db::{RepositoryError, carts, members, orders, payments};
use crate::models::order::{Order, Payment};
use crate::services::gateway::{CardSessionRequest, EVENT_CHECKOUT_COMPLETED, GatewayError};
use crate::services::notifications::OrderNotification;
use crate::state::AppState;

/// Errors from payment processing.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Order missing or not owned by the caller.
    #[error("order not found")]
    OrderNotFound,

    /// Payment row missing or not owned by the caller.
    #[error("payment not found")]
    PaymentNotFound,

    /// The order already has a settled payment.
    #[error("order already settled")]
    AlreadySettled,

    /// The order is not in a payable state.
    #[error("order is not payable")]
    NotPayable,

    /// Webhook signature did not verify.
    #[error("invalid webhook signature")]
    InvalidSignature,

    /// Gateway interaction failed.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Result of starting a payment.
#[derive(Debug, Clone)]
pub enum StartOutcome {
    /// Send the customer to the provider's page.
    Redirect { payment_id: PaymentId, url: String },
    /// Cash on delivery: the order is confirmed immediately.
    CodConfirmed { order: Order },
}

/// Result of a settlement attempt (return redirect or webhook).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// This attempt won the claim and finalized the order.
    Finalized,
    /// Another attempt settled first; nothing was changed.
    AlreadySettled,
}

/// Result of processing a webhook delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Finalized,
    AlreadySettled,
    /// Event type we don't act on, acknowledged without effect.
    Ignored,
}

/// The discount and charge amount implied by an order's stored fields.
#[must_use]
pub fn charge_amounts(order: &Order) -> (Decimal, Decimal) {
    let discount = discount_for_points(order.loyalty_points_used);
    (discount, order.subtotal - discount)
}

/// Start a payment for a pending order.
///
/// # Errors
///
/// Returns `OrderNotFound` for missing/foreign orders, `NotPayable` for
/// orders past Pending, and gateway errors for provider failures.
pub async fn start(
    state: &AppState,
    user_id: UserId,
    order_id: OrderId,
    method: PaymentMethod,
) -> Result<StartOutcome, PaymentError> {
    let order = OrderRepository::new(state.pool())
        .get_for_user(order_id, user_id)
        .await?
        .ok_or(PaymentError::OrderNotFound)?;

    if order.status != OrderStatus::Pending {
        return Err(PaymentError::NotPayable);
    }

    let (discount, total) = charge_amounts(&order);
    let base_url = &state.config().base_url;

    match method {
        PaymentMethod::CashOnDelivery => start_cod(state, &order, total, discount).await,
        PaymentMethod::Card => {
            let payment = payments::create(
                state.pool(),
                order.id,
                method,
                PaymentStatus::Pending,
                total,
                discount,
            )
            .await?;

            let session = state
                .card_gateway()
                .create_checkout_session(&CardSessionRequest {
                    order_number: order.order_number.as_str(),
                    amount: total,
                    success_url: &format!(
                        "{base_url}/payment/card/return?payment_id={}",
                        payment.id
                    ),
                    cancel_url: &format!("{base_url}/payment/cancel?payment_id={}", payment.id),
                })
                .await?;

            payments::set_gateway_session(state.pool(), payment.id, &session.id).await?;

            Ok(StartOutcome::Redirect {
                payment_id: payment.id,
                url: session.url,
            })
        }
        PaymentMethod::Wallet => {
            let payment = payments::create(
                state.pool(),
                order.id,
                method,
                PaymentStatus::Pending,
                total,
                discount,
            )
            .await?;

            let approval = state
                .wallet_gateway()
                .create_payment(
                    total,
                    &format!("WinnieCho order {}", order.order_number),
                    &format!(
                        "{base_url}/payment/wallet/return?payment_id={}",
                        payment.id
                    ),
                    &format!("{base_url}/payment/cancel?payment_id={}", payment.id),
                )
                .await?;

            payments::set_gateway_session(state.pool(), payment.id, &approval.payment_id).await?;

            Ok(StartOutcome::Redirect {
                payment_id: payment.id,
                url: approval.approval_url,
            })
        }
    }
}

/// Cash on delivery: record the attempt as cash-pending and confirm the
/// order on the spot. The payment row settles to Success when the driver
/// marks the order delivered.
async fn start_cod(
    state: &AppState,
    order: &Order,
    total: Decimal,
    discount: Decimal,
) -> Result<StartOutcome, PaymentError> {
    let owner = OrderRepository::new(state.pool())
        .owner(order.id)
        .await?
        .ok_or(PaymentError::OrderNotFound)?;

    let mut tx = state.pool().begin().await.map_err(RepositoryError::from)?;

    let payment = payments::create(
        &mut *tx,
        order.id,
        PaymentMethod::CashOnDelivery,
        PaymentStatus::CashPending,
        total,
        discount,
    )
    .await?;

    let transitioned =
        orders::transition_status(&mut *tx, order.id, OrderStatus::Pending, OrderStatus::Confirmed)
            .await?;
    if !transitioned {
        return Err(PaymentError::AlreadySettled);
    }

    let points = award_and_clear(&mut tx, order, &owner, total).await?;

    tx.commit().await.map_err(RepositoryError::from)?;

    tracing::info!(order_number = %order.order_number, "cash on delivery order confirmed");

    state.notifier().notify_order_paid(OrderNotification {
        customer_name: owner.name,
        customer_email: owner.email,
        order_number: order.order_number.to_string(),
        amount_paid: total,
        points_earned: points,
        payment_method: payment.method.to_string(),
    });

    let confirmed = OrderRepository::new(state.pool())
        .get(order.id)
        .await?
        .ok_or(PaymentError::OrderNotFound)?;

    Ok(StartOutcome::CodConfirmed { order: confirmed })
}

/// Settle a card payment from the customer's return redirect. The redirect
/// itself proves nothing, so the session is re-checked with the provider
/// before the claim.
///
/// # Errors
///
/// Returns `PaymentNotFound` for missing/foreign payments and gateway
/// errors when the provider does not report the session paid.
pub async fn confirm_card_return(
    state: &AppState,
    user_id: UserId,
    payment_id: PaymentId,
) -> Result<ConfirmOutcome, PaymentError> {
    let payment = owned_payment(state, user_id, payment_id).await?;

    let session_id = payment
        .gateway_session_id
        .clone()
        .ok_or(PaymentError::PaymentNotFound)?;

    let transaction_id = state.card_gateway().confirm_session_paid(&session_id).await?;

    let details = json!({ "source": "return", "session_id": session_id });
    finalize_success(state, &payment, &transaction_id, &details).await
}

/// Settle a wallet payment from the customer's return redirect by
/// executing the approved payment with the payer id.
///
/// # Errors
///
/// Returns gateway errors when the provider does not approve; the payment
/// row is marked failed in that case so the attempt is visibly dead.
pub async fn confirm_wallet_return(
    state: &AppState,
    user_id: UserId,
    payment_id: PaymentId,
    payer_id: &str,
) -> Result<ConfirmOutcome, PaymentError> {
    let payment = owned_payment(state, user_id, payment_id).await?;

    if payment.status == PaymentStatus::Success {
        return Ok(ConfirmOutcome::AlreadySettled);
    }

    let wallet_payment_id = payment
        .gateway_session_id
        .clone()
        .ok_or(PaymentError::PaymentNotFound)?;

    let capture = match state
        .wallet_gateway()
        .execute_payment(&wallet_payment_id, payer_id)
        .await
    {
        Ok(capture) => capture,
        Err(error @ GatewayError::Rejected(_)) => {
            let details = json!({ "source": "return", "error": error.to_string() });
            payments::mark_failed(state.pool(), payment.id, &details).await?;
            return Err(error.into());
        }
        Err(error) => return Err(error.into()),
    };

    let details = json!({ "source": "return", "wallet_payment_id": wallet_payment_id });
    finalize_success(state, &payment, &capture.transaction_id, &details).await
}

/// Process a signed card gateway webhook delivery.
///
/// # Errors
///
/// Returns `InvalidSignature` when the signature does not verify and
/// `PaymentNotFound` when the session maps to no payment row.
pub async fn confirm_webhook(
    state: &AppState,
    payload: &str,
    signature_header: &str,
) -> Result<WebhookOutcome, PaymentError> {
    let event = state
        .card_gateway()
        .verify_webhook(payload, signature_header)
        .map_err(|error| match error {
            GatewayError::Rejected(_) => PaymentError::InvalidSignature,
            other => PaymentError::Gateway(other),
        })?;

    if event.event_type != EVENT_CHECKOUT_COMPLETED {
        tracing::debug!(event_type = %event.event_type, "ignoring webhook event");
        return Ok(WebhookOutcome::Ignored);
    }

    let session_id = &event.data.object.id;
    let payment = PaymentRepository::new(state.pool())
        .get_by_gateway_session(session_id)
        .await?
        .ok_or(PaymentError::PaymentNotFound)?;

    let transaction_id = event
        .data
        .object
        .payment_intent
        .clone()
        .unwrap_or_else(|| session_id.clone());

    let details = json!({ "source": "webhook", "session_id": session_id });
    match finalize_success(state, &payment, &transaction_id, &details).await? {
        ConfirmOutcome::Finalized => Ok(WebhookOutcome::Finalized),
        ConfirmOutcome::AlreadySettled => Ok(WebhookOutcome::AlreadySettled),
    }
}

/// Cancel an open payment attempt. The order stays Pending so the
/// customer can retry with another method.
///
/// # Errors
///
/// Returns `PaymentNotFound` for missing/foreign payments and
/// `AlreadySettled` for payments that already succeeded.
pub async fn cancel(
    state: &AppState,
    user_id: UserId,
    payment_id: PaymentId,
) -> Result<(), PaymentError> {
    let payment = owned_payment(state, user_id, payment_id).await?;

    let details = json!({ "source": "cancel" });
    let cancelled = payments::mark_cancelled(state.pool(), payment.id, &details).await?;
    if !cancelled {
        return Err(PaymentError::AlreadySettled);
    }

    tracing::info!(payment_id = %payment.id, "payment cancelled by customer");
    Ok(())
}

/// The shared settlement path: claim the payment row, confirm the order,
/// award points, clear the cart, notify. Exactly one caller per order gets
/// `Finalized`.
async fn finalize_success(
    state: &AppState,
    payment: &Payment,
    transaction_id: &str,
    details: &serde_json::Value,
) -> Result<ConfirmOutcome, PaymentError> {
    let order_repo = OrderRepository::new(state.pool());
    let order = order_repo
        .get(payment.order_id)
        .await?
        .ok_or(PaymentError::OrderNotFound)?;
    let owner = order_repo
        .owner(payment.order_id)
        .await?
        .ok_or(PaymentError::OrderNotFound)?;

    let mut tx = state.pool().begin().await.map_err(RepositoryError::from)?;

    let Some(claimed) =
        payments::claim_success(&mut *tx, payment.id, transaction_id, details).await?
    else {
        return Ok(ConfirmOutcome::AlreadySettled);
    };

    let transitioned = orders::transition_status(
        &mut *tx,
        order.id,
        OrderStatus::Pending,
        OrderStatus::Confirmed,
    )
    .await?;
    if !transitioned {
        // A different payment row already settled this order. Dropping the
        // transaction rolls the claim back.
        return Ok(ConfirmOutcome::AlreadySettled);
    }

    let points = award_and_clear(&mut tx, &order, &owner, claimed.total_amount).await?;

    tx.commit().await.map_err(RepositoryError::from)?;

    tracing::info!(
        order_number = %order.order_number,
        transaction_id,
        points_earned = %points,
        "payment settled"
    );

    state.notifier().notify_order_paid(OrderNotification {
        customer_name: owner.name,
        customer_email: owner.email,
        order_number: order.order_number.to_string(),
        amount_paid: claimed.total_amount,
        points_earned: points,
        payment_method: claimed.method.to_string(),
    });

    Ok(ConfirmOutcome::Finalized)
}

/// Inside the settlement transaction: credit loyalty points for the paid
/// amount, record them on the order, and clear the buyer's cart.
async fn award_and_clear(
    tx: &mut sqlx::PgTransaction<'_>,
    order: &Order,
    owner: &crate::db::orders::OrderOwner,
    amount_paid: Decimal,
) -> Result<Decimal, PaymentError> {
    let points = points_for_spend(amount_paid);

    members::earn(&mut **tx, owner.user_id, points, amount_paid).await?;
    orders::set_points_earned(&mut **tx, order.id, points).await?;
    carts::clear_for_user(&mut **tx, owner.user_id).await?;

    Ok(points)
}

/// Settle an open cash-on-delivery payment when its order is delivered.
/// Idempotent through the same success claim as the online methods.
///
/// # Errors
///
/// Returns `RepositoryError` wrapped in `PaymentError` on database failure.
pub async fn settle_cod_on_delivery(
    state: &AppState,
    order_id: OrderId,
) -> Result<(), PaymentError> {
    let Some(payment) = PaymentRepository::new(state.pool())
        .latest_for_order(order_id)
        .await?
    else {
        return Ok(());
    };

    if payment.method != PaymentMethod::CashOnDelivery {
        return Ok(());
    }

    let details = json!({ "source": "delivery" });
    let transaction_id = format!("cash-{order_id}");
    if payments::claim_success(state.pool(), payment.id, &transaction_id, &details)
        .await?
        .is_some()
    {
        tracing::info!(payment_id = %payment.id, "cash payment collected on delivery");
    }

    Ok(())
}

/// Load a payment and prove the caller owns its order.
async fn owned_payment(
    state: &AppState,
    user_id: UserId,
    payment_id: PaymentId,
) -> Result<Payment, PaymentError> {
    let payment = PaymentRepository::new(state.pool())
        .get(payment_id)
        .await?
        .ok_or(PaymentError::PaymentNotFound)?;

    OrderRepository::new(state.pool())
        .get_for_user(payment.order_id, user_id)
        .await?
        .ok_or(PaymentError::PaymentNotFound)?;

    Ok(payment)
}
