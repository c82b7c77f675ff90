//! `PgOrderStore` against a live Postgres.
//!
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use casecraft::orders::{AddressInput, PaidCheckout, PaymentOutcome, StoreError};
use casecraft::{OrderStore, PgOrderStore};

async fn connect() -> (PgOrderStore, PgPool) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .unwrap();
    let store = PgOrderStore::new(pool.clone());
    store.migrate().await.unwrap();
    (store, pool)
}

async fn insert_order(pool: &PgPool, id: &str) {
    sqlx::query("INSERT INTO orders (id, user_id) VALUES ($1, $2)")
        .bind(id)
        .bind("u1")
        .execute(pool)
        .await
        .unwrap();
}

/// Addresses are tagged with a per-test city so parallel runs don't interfere.
async fn count_addresses(pool: &PgPool, city: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM addresses WHERE city = $1")
        .bind(city)
        .fetch_one(pool)
        .await
        .unwrap()
}

fn checkout(order_id: &str, city: &str) -> PaidCheckout {
    let address = AddressInput {
        name: "A B".to_string(),
        street: "1 Main St".to_string(),
        city: city.to_string(),
        postal_code: "94107".to_string(),
        country: "US".to_string(),
        state: "CA".to_string(),
    };
    PaidCheckout {
        session_id: "cs_test_1".to_string(),
        order_id: order_id.to_string(),
        user_id: "u1".to_string(),
        customer_email: "a@b.com".to_string(),
        customer_name: "A B".to_string(),
        billing: address.clone(),
        shipping: address,
    }
}

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

#[tokio::test]
#[ignore] // Requires Postgres (DATABASE_URL)
async fn test_mark_paid_persists_order_and_addresses() {
    let (store, pool) = connect().await;
    let order_id = unique("order");
    let city = unique("city");
    insert_order(&pool, &order_id).await;

    let paid = match store.mark_paid(&checkout(&order_id, &city)).await.unwrap() {
        PaymentOutcome::Paid(paid) => paid,
        other => panic!("Expected Paid, got {:?}", other),
    };

    assert_eq!(paid.order.id, order_id);
    assert!(paid.order.is_paid);
    assert!(paid.order.paid_at.is_some());
    assert_eq!(paid.order.billing_address_id, Some(paid.billing.id));
    assert_eq!(paid.order.shipping_address_id, Some(paid.shipping.id));
    assert_ne!(paid.billing.id, paid.shipping.id);
    assert_eq!(paid.shipping.name, "A B");
    assert_eq!(count_addresses(&pool, &city).await, 2);

    let (is_paid,): (bool,) = sqlx::query_as("SELECT is_paid FROM orders WHERE id = $1")
        .bind(&order_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(is_paid);
}

#[tokio::test]
#[ignore] // Requires Postgres (DATABASE_URL)
async fn test_mark_paid_twice_writes_once() {
    let (store, pool) = connect().await;
    let order_id = unique("order");
    let city = unique("city");
    insert_order(&pool, &order_id).await;

    let first = match store.mark_paid(&checkout(&order_id, &city)).await.unwrap() {
        PaymentOutcome::Paid(paid) => paid,
        other => panic!("Expected Paid, got {:?}", other),
    };

    match store.mark_paid(&checkout(&order_id, &city)).await.unwrap() {
        PaymentOutcome::AlreadyPaid(order) => {
            assert_eq!(order.paid_at, first.order.paid_at);
            assert_eq!(order.billing_address_id, Some(first.billing.id));
            assert_eq!(order.shipping_address_id, Some(first.shipping.id));
        }
        other => panic!("Expected AlreadyPaid, got {:?}", other),
    }

    assert_eq!(count_addresses(&pool, &city).await, 2);
}

#[tokio::test]
#[ignore] // Requires Postgres (DATABASE_URL)
async fn test_mark_paid_unknown_order_writes_nothing() {
    let (store, pool) = connect().await;
    let order_id = unique("missing");
    let city = unique("city");

    match store.mark_paid(&checkout(&order_id, &city)).await {
        Err(StoreError::OrderNotFound(id)) => assert_eq!(id, order_id),
        other => panic!("Expected OrderNotFound, got {:?}", other),
    }

    assert_eq!(count_addresses(&pool, &city).await, 0);
    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE id = $1")
        .bind(&order_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orders, 0);
}
