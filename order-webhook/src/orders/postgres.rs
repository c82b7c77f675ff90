//! Postgres-backed [`OrderStore`].

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use super::store::{OrderStore, StoreError};
use super::types::{Address, AddressInput, Order, PaidCheckout, PaidOrder, PaymentOutcome};

const ORDER_COLUMNS: &str =
    "id, user_id, is_paid, paid_at, created_at, billing_address_id, shipping_address_id";

/// Order store over a shared connection pool.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("database_migrations_applied");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("database_pool_closed");
    }
}

async fn insert_address(
    tx: &mut Transaction<'_, Postgres>,
    input: &AddressInput,
) -> Result<Address, sqlx::Error> {
    sqlx::query_as::<_, Address>(
        r#"
        INSERT INTO addresses (id, name, street, city, postal_code, country, state)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, name, street, city, postal_code, country, state
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&input.name)
    .bind(&input.street)
    .bind(&input.city)
    .bind(&input.postal_code)
    .bind(&input.country)
    .bind(&input.state)
    .fetch_one(&mut **tx)
    .await
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn mark_paid(&self, checkout: &PaidCheckout) -> Result<PaymentOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent redeliveries of the same event
        let existing = sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE id = $1 FOR UPDATE",
            ORDER_COLUMNS
        ))
        .bind(&checkout.order_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(existing) = existing else {
            tx.rollback().await?;
            return Err(StoreError::OrderNotFound(checkout.order_id.clone()));
        };

        if existing.is_paid {
            tx.rollback().await?;
            return Ok(PaymentOutcome::AlreadyPaid(existing));
        }

        let billing = insert_address(&mut tx, &checkout.billing).await?;
        let shipping = insert_address(&mut tx, &checkout.shipping).await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE orders
            SET is_paid = TRUE,
                paid_at = NOW(),
                billing_address_id = $2,
                shipping_address_id = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(&checkout.order_id)
        .bind(billing.id)
        .bind(shipping.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            order_id = %order.id,
            billing_address_id = %billing.id,
            shipping_address_id = %shipping.id,
            "database_order_marked_paid"
        );

        Ok(PaymentOutcome::Paid(PaidOrder {
            order,
            billing,
            shipping,
        }))
    }
}
