//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database ping)
//!
//! # Auth
//! POST /auth/register          - Register a member account
//! POST /auth/login             - Login
//! POST /auth/logout            - Logout
//! POST /auth/forgot-password   - Email a single-use reset link
//! POST /auth/reset-password    - Set a new password with the token
//!
//! # Catalog (public)
//! GET  /products               - Product listing (?category=&q=&sort=)
//! GET  /products/{id}          - Product detail
//! GET  /categories             - Category listing
//!
//! # Cart (requires auth)
//! GET    /cart                 - Cart contents with totals
//! DELETE /cart                 - Empty the cart
//! POST   /cart/items           - Add a product to the cart
//! PUT    /cart/items/{id}      - Set a line's quantity
//! DELETE /cart/items/{id}      - Remove a line
//!
//! # Checkout and orders (requires auth)
//! POST /checkout               - Place an order from the cart
//! GET  /orders                 - Order history (cancelled excluded)
//! GET  /orders/{id}            - Order detail with items and payment
//!
//! # Payment (requires auth except webhook)
//! POST /payment/process        - Start a payment for a pending order
//! GET  /payment/card/return    - Card provider success redirect
//! GET  /payment/wallet/return  - Wallet provider approval redirect
//! GET  /payment/cancel         - Customer abandoned the provider page
//! POST /payment/webhook        - Signed card provider webhook
//!
//! # Account (requires auth)
//! GET    /account                        - Profile with loyalty balance
//! PUT    /account/profile                - Update name and phone
//! POST   /account/password               - Change password
//! GET    /account/addresses              - Address list
//! POST   /account/addresses              - Create address
//! PUT    /account/addresses/{id}         - Update address
//! POST   /account/addresses/{id}/default - Make address the default
//! DELETE /account/addresses/{id}         - Delete a non-default address
//!
//! # Fulfillment (requires staff)
//! GET  /driver/orders              - Orders awaiting fulfillment
//! POST /driver/orders/{id}/status  - Advance order status
//! POST /driver/orders/{id}/proof   - Upload proof of delivery (multipart)
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod driver;
pub mod orders;
pub mod payment;
pub mod products;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .route("/categories", get(products::categories))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route("/items/{id}", put(cart::update).delete(cart::remove))
}

/// Create the checkout and order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(checkout::place))
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/process", post(payment::process))
        .route("/card/return", get(payment::card_return))
        .route("/wallet/return", get(payment::wallet_return))
        .route("/cancel", get(payment::cancel))
        .route("/webhook", post(payment::webhook))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::profile))
        .route("/profile", put(account::update_profile))
        .route("/password", post(account::change_password))
        .route("/addresses", get(account::list_addresses).post(account::create_address))
        .route(
            "/addresses/{id}",
            put(account::update_address).delete(account::delete_address),
        )
        .route("/addresses/{id}/default", post(account::set_default_address))
}

/// Create the fulfillment (staff) routes router.
pub fn driver_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(driver::index))
        .route("/orders/{id}/status", post(driver::advance_status))
        .route("/orders/{id}/proof", post(driver::upload_proof))
}

/// Assemble the full application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .merge(catalog_routes())
        .nest("/cart", cart_routes())
        .merge(order_routes())
        .nest("/payment", payment_routes())
        .nest("/account", account_routes())
        .nest("/driver", driver_routes())
}
