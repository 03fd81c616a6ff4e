//! WinnieCho Core - Shared types library.
//!
//! This crate provides common types used across all WinnieCho components:
//! - `storefront` - Public-facing chocolate shop
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure arithmetic - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows
//! it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, statuses,
//!   order numbers, and the loyalty rate arithmetic

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
