//! Stripe event payloads.
//!
//! Only the fields this service reads are modelled. Unknown fields are ignored
//! so API version bumps don't break parsing.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::orders::{AddressInput, AddressKind, PaidCheckout};

/// Event type emitted when a Checkout Session completes.
pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

/// Metadata key carrying the storefront user id.
pub const METADATA_USER_ID: &str = "userId";

/// Metadata key carrying the storefront order id.
pub const METADATA_ORDER_ID: &str = "orderId";

/// Problems with a verified event's contents.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("malformed event payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("checkout session has no customer email")]
    MissingEmail,
    #[error("checkout session metadata is missing {0}")]
    MissingMetadata(&'static str),
    #[error("checkout session has no customer name")]
    MissingCustomerName,
    #[error("checkout session has no {0} address")]
    MissingAddress(AddressKind),
    #[error("{address} address is missing {field}")]
    MissingAddressField {
        address: AddressKind,
        field: &'static str,
    },
}

/// Envelope of every Stripe webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub livemode: bool,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

impl Event {
    /// View the event's object as a Checkout Session.
    pub fn checkout_session(&self) -> Result<CheckoutSession, EventError> {
        Ok(CheckoutSession::deserialize(&self.data.object)?)
    }
}

/// The subset of a Checkout Session object this service needs.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
    #[serde(default)]
    pub shipping_details: Option<ShippingDetails>,
    /// Newer API versions move shipping details here.
    #[serde(default)]
    pub collected_information: Option<CollectedInformation>,
    #[serde(default)]
    pub payment_status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerDetails {
    pub email: Option<String>,
    pub name: Option<String>,
    pub address: Option<StripeAddress>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShippingDetails {
    pub address: Option<StripeAddress>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectedInformation {
    pub shipping_details: Option<ShippingDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StripeAddress {
    pub city: Option<String>,
    pub country: Option<String>,
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub postal_code: Option<String>,
    pub state: Option<String>,
}

/// Trimmed, non-empty copy of an optional field.
fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl StripeAddress {
    fn to_input(&self, kind: AddressKind, name: String) -> Result<AddressInput, EventError> {
        let require = |value: &Option<String>, field: &'static str| {
            present(value).ok_or(EventError::MissingAddressField {
                address: kind,
                field,
            })
        };

        Ok(AddressInput {
            name,
            street: require(&self.line1, "line1")?,
            city: require(&self.city, "city")?,
            postal_code: require(&self.postal_code, "postal_code")?,
            country: require(&self.country, "country")?,
            state: require(&self.state, "state")?,
        })
    }
}

impl CheckoutSession {
    fn metadata_value(&self, key: &'static str) -> Result<String, EventError> {
        self.metadata
            .as_ref()
            .and_then(|m| present(&m.get(key).cloned()))
            .ok_or(EventError::MissingMetadata(key))
    }

    fn shipping(&self) -> Option<&ShippingDetails> {
        self.shipping_details.as_ref().or_else(|| {
            self.collected_information
                .as_ref()
                .and_then(|c| c.shipping_details.as_ref())
        })
    }

    /// Validate the session and extract what is needed to settle the order.
    ///
    /// Checks run in order: customer email, metadata, customer name, billing
    /// address, shipping address. The first failure is returned. Both
    /// addresses carry the customer's name.
    pub fn into_paid_checkout(self) -> Result<PaidCheckout, EventError> {
        let customer = self.customer_details.clone().unwrap_or_default();

        let customer_email = present(&customer.email).ok_or(EventError::MissingEmail)?;
        let user_id = self.metadata_value(METADATA_USER_ID)?;
        let order_id = self.metadata_value(METADATA_ORDER_ID)?;
        let customer_name = present(&customer.name).ok_or(EventError::MissingCustomerName)?;

        let billing = customer
            .address
            .as_ref()
            .ok_or(EventError::MissingAddress(AddressKind::Billing))?
            .to_input(AddressKind::Billing, customer_name.clone())?;

        let shipping = self
            .shipping()
            .and_then(|s| s.address.as_ref())
            .ok_or(EventError::MissingAddress(AddressKind::Shipping))?
            .to_input(AddressKind::Shipping, customer_name.clone())?;

        debug!(
            session_id = %self.id,
            order_id = %order_id,
            payment_status = ?self.payment_status,
            "checkout_session_validated"
        );

        Ok(PaidCheckout {
            session_id: self.id,
            order_id,
            user_id,
            customer_email,
            customer_name,
            billing,
            shipping,
        })
    }
}
