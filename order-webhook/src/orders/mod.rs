//! Order persistence.
//!
//! This module provides:
//! - Order and address records
//! - The [`OrderStore`] trait with Postgres and in-memory implementations

pub mod postgres;
pub mod store;
pub mod types;

pub use postgres::PgOrderStore;
pub use store::{MemoryOrderStore, OrderStore, StoreError};
pub use types::{
    Address, AddressInput, AddressKind, Order, PaidCheckout, PaidOrder, PaymentOutcome,
};
