//! Database-backed tests for the conditional-UPDATE guards.
//!
//! Every race-sensitive write in the repository layer carries its check in
//! the UPDATE predicate. These tests run the contended paths against a
//! real `PostgreSQL` to show the guards hold: stock never oversells, an
//! order settles at most one successful payment, loyalty balances never go
//! negative, and single-use tokens are claimed exactly once.
//!
//! `#[sqlx::test]` provisions an isolated database per test and applies
//! `./migrations`; `DATABASE_URL` must point at a reachable server.

use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;

use winniecho_core::{
    AddressId, Email, OrderStatus, PaymentMethod, PaymentStatus, ProductId, ProductStatus, UserId,
};
use winniecho_storefront::db::addresses::{AddressInput, AddressRepository};
use winniecho_storefront::db::members::{self, MemberRepository};
use winniecho_storefront::db::orders::{self, OrderRepository};
use winniecho_storefront::db::password_resets;
use winniecho_storefront::db::payments::{self, PaymentRepository};
use winniecho_storefront::db::products::{ProductRepository, decrement_stock};
use winniecho_storefront::db::users::UserRepository;
use winniecho_storefront::models::order::Order;

async fn seed_member(pool: &PgPool, email: &str) -> UserId {
    let email = Email::parse(email).unwrap();
    let user = UserRepository::new(pool)
        .create_member("Aisyah", &email, "not-a-real-hash", "0123456789")
        .await
        .unwrap();
    user.id
}

async fn seed_address(pool: &PgPool, user_id: UserId) -> AddressId {
    let address = AddressRepository::new(pool)
        .create(
            user_id,
            &AddressInput {
                label: "Home".to_string(),
                line: "12 Jalan Coklat".to_string(),
                city: "Shah Alam".to_string(),
                state: "Selangor".to_string(),
                postal_code: "40000".to_string(),
                country: "Malaysia".to_string(),
                is_default: true,
            },
        )
        .await
        .unwrap();
    address.id
}

async fn seed_product(pool: &PgPool, stock: i32) -> ProductId {
    let category_id: i32 =
        sqlx::query_scalar("INSERT INTO categories (code, name) VALUES ('D', 'Dark') RETURNING id")
            .fetch_one(pool)
            .await
            .unwrap();

    sqlx::query_scalar::<_, ProductId>(
        "INSERT INTO products (category_id, name, price, stock)
         VALUES ($1, 'Dark 70%', $2, $3) RETURNING id",
    )
    .bind(category_id)
    .bind(Decimal::new(25_00, 2))
    .bind(stock)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn seed_order(pool: &PgPool) -> Order {
    let user_id = seed_member(pool, "aisyah@example.com").await;
    let address_id = seed_address(pool, user_id).await;
    orders::create(pool, address_id, Decimal::new(75_00, 2), Decimal::ZERO)
        .await
        .unwrap()
}

#[sqlx::test]
async fn concurrent_checkouts_cannot_oversell(pool: PgPool) {
    let product_id = seed_product(&pool, 5).await;

    // Two checkouts want 3 each out of 5. Only one can fit.
    let (first, second) = tokio::join!(
        decrement_stock(&pool, product_id, 3),
        decrement_stock(&pool, product_id, 3),
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert!(first ^ second, "exactly one decrement must win");

    let product = ProductRepository::new(&pool)
        .get(product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.stock, 2);
}

#[sqlx::test]
async fn draining_stock_flips_out_of_stock_and_blocks_further_sales(pool: PgPool) {
    let product_id = seed_product(&pool, 3).await;

    assert!(decrement_stock(&pool, product_id, 3).await.unwrap());

    let repo = ProductRepository::new(&pool);
    let product = repo.get(product_id).await.unwrap().unwrap();
    assert_eq!(product.stock, 0);
    assert_eq!(product.status, ProductStatus::OutOfStock);

    // The floor holds even for a single unit.
    assert!(!decrement_stock(&pool, product_id, 1).await.unwrap());
    let product = repo.get(product_id).await.unwrap().unwrap();
    assert_eq!(product.stock, 0);
}

#[sqlx::test]
async fn racing_settlements_produce_one_success(pool: PgPool) {
    let order = seed_order(&pool).await;
    let payment = payments::create(
        &pool,
        order.id,
        PaymentMethod::Card,
        PaymentStatus::Pending,
        Decimal::new(75_00, 2),
        Decimal::ZERO,
    )
    .await
    .unwrap();

    // Return redirect and webhook both try to settle the same attempt.
    let redirect_details = json!({"via": "return"});
    let webhook_details = json!({"via": "webhook"});
    let (redirect, webhook) = tokio::join!(
        payments::claim_success(&pool, payment.id, "txn-redirect", &redirect_details),
        payments::claim_success(&pool, payment.id, "txn-webhook", &webhook_details),
    );
    let (redirect, webhook) = (redirect.unwrap(), webhook.unwrap());

    assert!(
        redirect.is_some() ^ webhook.is_some(),
        "exactly one settlement must win the claim"
    );

    let settled = PaymentRepository::new(&pool)
        .get(payment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(settled.status, PaymentStatus::Success);

    // Success is sticky: a late failure report cannot downgrade it.
    assert!(
        !payments::mark_failed(&pool, payment.id, &json!({"via": "late webhook"}))
            .await
            .unwrap()
    );
    let after = PaymentRepository::new(&pool)
        .get(payment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.status, PaymentStatus::Success);
}

#[sqlx::test]
async fn order_transitions_are_claimed_once(pool: PgPool) {
    let order = seed_order(&pool).await;

    let (first, second) = tokio::join!(
        orders::transition_status(&pool, order.id, OrderStatus::Pending, OrderStatus::Confirmed),
        orders::transition_status(&pool, order.id, OrderStatus::Pending, OrderStatus::Confirmed),
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert!(first ^ second, "exactly one transition must win");

    let order = OrderRepository::new(&pool)
        .get(order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Confirmed);
}

#[sqlx::test]
async fn redemptions_never_overdraw_the_balance(pool: PgPool) {
    let user_id = seed_member(&pool, "aisyah@example.com").await;
    members::earn(&pool, user_id, Decimal::from(50), Decimal::new(500_00, 2))
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        members::redeem(&pool, user_id, Decimal::from(30)),
        members::redeem(&pool, user_id, Decimal::from(30)),
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert!(first ^ second, "exactly one redemption must win");

    let member = MemberRepository::new(&pool)
        .get(user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(member.loyalty_points, Decimal::from(20));
}

#[sqlx::test]
async fn reset_tokens_are_single_use(pool: PgPool) {
    let user_id = seed_member(&pool, "aisyah@example.com").await;
    password_resets::create(&pool, user_id, "one-shot-token")
        .await
        .unwrap();

    assert_eq!(
        password_resets::consume(&pool, "one-shot-token").await.unwrap(),
        Some(user_id)
    );
    assert_eq!(
        password_resets::consume(&pool, "one-shot-token").await.unwrap(),
        None
    );
    assert_eq!(
        password_resets::consume(&pool, "never-issued").await.unwrap(),
        None
    );
}
