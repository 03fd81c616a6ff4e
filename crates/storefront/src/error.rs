//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::checkout::CheckoutError;
use crate::services::fulfillment::FulfillmentError;
use crate::services::gateway::GatewayError;
use crate::services::payment::PaymentError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout was rejected.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Payment processing failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Order fulfillment operation was rejected.
    #[error("Fulfillment error: {0}")]
    Fulfillment(#[from] FulfillmentError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_) | Self::Internal(_) => true,
            Self::Payment(err) => matches!(
                err,
                PaymentError::Gateway(GatewayError::Http(_)) | PaymentError::Repository(_)
            ),
            Self::Auth(err) => matches!(err, AuthError::Repository(_) | AuthError::Hash(_)),
            Self::Checkout(err) => matches!(err, CheckoutError::Repository(_)),
            Self::Fulfillment(err) => {
                matches!(
                    err,
                    FulfillmentError::Repository(_) | FulfillmentError::Storage(_)
                )
            }
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::EmailTaken => StatusCode::CONFLICT,
                AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::InvalidResetToken => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::Hash(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart
                | CheckoutError::QuantityExceedsStock { .. }
                | CheckoutError::InvalidPointsAmount
                | CheckoutError::InsufficientPoints
                | CheckoutError::DiscountExceedsTotal => StatusCode::UNPROCESSABLE_ENTITY,
                CheckoutError::AddressNotFound => StatusCode::NOT_FOUND,
                CheckoutError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Payment(err) => match err {
                PaymentError::OrderNotFound | PaymentError::PaymentNotFound => {
                    StatusCode::NOT_FOUND
                }
                PaymentError::AlreadySettled | PaymentError::NotPayable => {
                    StatusCode::CONFLICT
                }
                PaymentError::InvalidSignature | PaymentError::Gateway(GatewayError::Rejected(_)) => {
                    StatusCode::BAD_REQUEST
                }
                PaymentError::Gateway(_) => StatusCode::BAD_GATEWAY,
                PaymentError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Fulfillment(err) => match err {
                FulfillmentError::OrderNotFound => StatusCode::NOT_FOUND,
                FulfillmentError::InvalidTransition { .. }
                | FulfillmentError::NotYetShipped
                | FulfillmentError::Superseded => StatusCode::CONFLICT,
                FulfillmentError::Repository(_) | FulfillmentError::Storage(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-facing message. Internal failures collapse to a generic line
    /// so database and gateway details never leave the server.
    fn client_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::EmailTaken => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::InvalidResetToken => err.to_string(),
                AuthError::Repository(_) | AuthError::Hash(_) => {
                    "Internal server error".to_string()
                }
            },
            Self::Checkout(CheckoutError::Repository(_))
            | Self::Payment(PaymentError::Repository(_))
            | Self::Fulfillment(FulfillmentError::Repository(_) | FulfillmentError::Storage(_)) => {
                "Internal server error".to_string()
            }
            Self::Payment(PaymentError::Gateway(GatewayError::Http(_))) => {
                "Payment provider unavailable".to_string()
            }
            Self::Checkout(err) => err.to_string(),
            Self::Payment(err) => err.to_string(),
            Self::Fulfillment(err) => err.to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = Json(json!({ "error": self.client_message() }));
        (self.status(), body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user
/// actions leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order 123".to_string());
        assert_eq!(err.to_string(), "Not found: order 123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            status_of(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_checkout_errors_are_unprocessable() {
        assert_eq!(
            status_of(AppError::Checkout(CheckoutError::EmptyCart)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(AppError::Checkout(CheckoutError::InsufficientPoints)),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_stale_reset_token_is_bad_request() {
        let err = AppError::Auth(AuthError::InvalidResetToken);
        assert_eq!(err.client_message(), "invalid or expired reset link");
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_settled_payment_conflicts() {
        assert_eq!(
            status_of(AppError::Payment(PaymentError::AlreadySettled)),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "no cart for user 7".to_string(),
        ));
        assert_eq!(err.client_message(), "Internal server error");
    }
}
