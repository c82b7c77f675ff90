//! Order persistence seam.
//!
//! [`OrderStore`] is implemented by [`PgOrderStore`](super::PgOrderStore) in
//! production and by [`MemoryOrderStore`] for tests and local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::types::{Address, Order, PaidCheckout, PaidOrder, PaymentOutcome};

/// Persistence failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("order {0} not found")]
    OrderNotFound(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Mark an order paid and attach fresh billing and shipping addresses.
    ///
    /// Atomic: either the flag and both addresses are written, or nothing is.
    /// An order that is already paid is left untouched and reported as
    /// [`PaymentOutcome::AlreadyPaid`].
    async fn mark_paid(&self, checkout: &PaidCheckout) -> Result<PaymentOutcome, StoreError>;
}

#[derive(Default)]
struct MemoryState {
    orders: HashMap<String, Order>,
    addresses: Vec<Address>,
    unavailable: Option<String>,
}

/// In-memory [`OrderStore`].
#[derive(Default)]
pub struct MemoryOrderStore {
    state: RwLock<MemoryState>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an unpaid order.
    pub async fn insert_order(&self, id: &str, user_id: &str) -> Order {
        let order = Order {
            id: id.to_string(),
            user_id: user_id.to_string(),
            is_paid: false,
            paid_at: None,
            created_at: Utc::now(),
            billing_address_id: None,
            shipping_address_id: None,
        };
        self.state
            .write()
            .await
            .orders
            .insert(order.id.clone(), order.clone());
        order
    }

    pub async fn order(&self, id: &str) -> Option<Order> {
        self.state.read().await.orders.get(id).cloned()
    }

    /// Every address row created so far, in insertion order.
    pub async fn addresses(&self) -> Vec<Address> {
        self.state.read().await.addresses.clone()
    }

    /// Make subsequent writes fail with [`StoreError::Unavailable`].
    pub async fn set_unavailable(&self, reason: Option<&str>) {
        self.state.write().await.unavailable = reason.map(str::to_string);
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn mark_paid(&self, checkout: &PaidCheckout) -> Result<PaymentOutcome, StoreError> {
        let mut state = self.state.write().await;

        if let Some(reason) = &state.unavailable {
            return Err(StoreError::Unavailable(reason.clone()));
        }

        let order = state
            .orders
            .get(&checkout.order_id)
            .cloned()
            .ok_or_else(|| StoreError::OrderNotFound(checkout.order_id.clone()))?;

        if order.is_paid {
            return Ok(PaymentOutcome::AlreadyPaid(order));
        }

        let billing = Address::new(Uuid::new_v4(), &checkout.billing);
        let shipping = Address::new(Uuid::new_v4(), &checkout.shipping);

        let order = Order {
            is_paid: true,
            paid_at: Some(Utc::now()),
            billing_address_id: Some(billing.id),
            shipping_address_id: Some(shipping.id),
            ..order
        };

        state.addresses.push(billing.clone());
        state.addresses.push(shipping.clone());
        state.orders.insert(order.id.clone(), order.clone());

        info!(order_id = %order.id, "memory_order_marked_paid");

        Ok(PaymentOutcome::Paid(PaidOrder {
            order,
            billing,
            shipping,
        }))
    }
}
