//! Order and address records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Which of the two addresses on an order a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Billing,
    Shipping,
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressKind::Billing => f.write_str("billing"),
            AddressKind::Shipping => f.write_str("shipping"),
        }
    }
}

/// A validated postal address, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressInput {
    pub name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub state: String,
}

/// A persisted address row. A fresh row is created for every paid checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Address {
    pub id: Uuid,
    pub name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub state: String,
}

impl Address {
    pub fn new(id: Uuid, input: &AddressInput) -> Self {
        Self {
            id,
            name: input.name.clone(),
            street: input.street.clone(),
            city: input.city.clone(),
            postal_code: input.postal_code.clone(),
            country: input.country.clone(),
            state: input.state.clone(),
        }
    }
}

/// An order row as this service sees it.
///
/// Orders are created by the storefront; this service only flips `is_paid`
/// and attaches addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub billing_address_id: Option<Uuid>,
    pub shipping_address_id: Option<Uuid>,
}

/// Everything needed to settle an order, extracted from a completed checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaidCheckout {
    pub session_id: String,
    pub order_id: String,
    pub user_id: String,
    pub customer_email: String,
    pub customer_name: String,
    pub billing: AddressInput,
    pub shipping: AddressInput,
}

/// An order that was just marked paid, with its new addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaidOrder {
    pub order: Order,
    pub billing: Address,
    pub shipping: Address,
}

/// Result of settling an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The order transitioned to paid in this call.
    Paid(PaidOrder),
    /// The order was already paid; nothing was written.
    AlreadyPaid(Order),
}
