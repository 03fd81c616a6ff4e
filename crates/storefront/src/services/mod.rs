//! Business logic services.
//!
//! Services own the workflows that span repositories: registration and
//! login, checkout, payment orchestration against the external gateways,
//! order fulfillment, and outbound email. Route handlers stay thin and
//! delegate here.

pub mod auth;
pub mod checkout;
pub mod fulfillment;
pub mod gateway;
pub mod notifications;
pub mod payment;
