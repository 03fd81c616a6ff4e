//! Domain models mapped to database rows.

pub mod address;
pub mod cart;
pub mod member;
pub mod order;
pub mod product;
pub mod session;
pub mod user;
