//! Stripe webhook plumbing: signature verification and event payloads.

pub mod event;
pub mod signature;

pub use event::{
    CheckoutSession, Event, EventError, CHECKOUT_SESSION_COMPLETED, METADATA_ORDER_ID,
    METADATA_USER_ID,
};
pub use signature::{sign, verify_stripe_signature, verify_stripe_signature_at, SignatureError};

/// Header carrying the delivery signature.
pub const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";
