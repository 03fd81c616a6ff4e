//! Core types for WinnieCho.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod loyalty;
pub mod order_number;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use loyalty::{discount_for_points, points_for_spend};
pub use order_number::OrderNumber;
pub use status::*;
