//! Middleware and request extractors.

pub mod auth;
pub mod session;

pub use session::create_session_layer;
