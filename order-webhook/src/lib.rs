//! CaseCraft order webhooks.
//!
//! Receives Stripe `checkout.session.completed` deliveries, marks the
//! matching order paid, stores its billing and shipping addresses, and emails
//! the customer a confirmation.
//!
//! ## Architecture
//!
//! ```text
//! Stripe → POST /webhooks → WebhookProcessor → OrderStore (Postgres)
//!                                            → Mailer (SendGrid)
//! ```

pub mod config;
pub mod error;
pub mod mail;
pub mod orders;
pub mod process;
pub mod stripe;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use error::WebhookError;
pub use mail::{Mailer, SendGridMailer};
pub use orders::{MemoryOrderStore, OrderStore, PgOrderStore};
pub use process::{ProcessorSettings, WebhookProcessor};
pub use web::{router, AppState};
