//! Webhook delivery processing.
//!
//! ## Processing Flow
//!
//! ```text
//! raw body + Stripe-Signature → verify → Event → checkout.session.completed?
//!     → OrderStore::mark_paid → confirmation email (best effort)
//! ```

pub mod checkout;

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::{Config, ConfigError};
use crate::error::WebhookError;
use crate::mail::{EmailRenderer, MailError, Mailer, Sender};
use crate::orders::OrderStore;
use crate::stripe::{verify_stripe_signature, Event, EventError, CHECKOUT_SESSION_COMPLETED};

/// Static settings for a [`WebhookProcessor`].
#[derive(Debug, Clone)]
pub struct ProcessorSettings {
    pub webhook_secret: String,
    pub signature_tolerance_secs: u64,
    pub sender: Sender,
}

impl ProcessorSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            webhook_secret: config.stripe_webhook_secret.clone().unwrap_or_default(),
            signature_tolerance_secs: config.stripe_signature_tolerance_secs,
            sender: Sender {
                email: config.email_from_address.clone(),
                name: Some(config.email_from_name.clone()).filter(|n| !n.trim().is_empty()),
            },
        })
    }
}

/// Verifies deliveries and applies their side effects.
///
/// Holds no per-request state; one instance is shared by all requests.
pub struct WebhookProcessor {
    settings: ProcessorSettings,
    store: Arc<dyn OrderStore>,
    mailer: Arc<dyn Mailer>,
    renderer: EmailRenderer,
}

impl WebhookProcessor {
    pub fn new(
        settings: ProcessorSettings,
        store: Arc<dyn OrderStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self, MailError> {
        Ok(Self {
            settings,
            store,
            mailer,
            renderer: EmailRenderer::new()?,
        })
    }

    /// Handle one delivery.
    ///
    /// `body` must be the unmodified request body. On success returns the
    /// event exactly as received.
    pub async fn handle(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<serde_json::Value, WebhookError> {
        info!(
            body_length = body.len(),
            has_signature = signature.is_some(),
            "stripe_webhook_received"
        );

        let Some(signature) = signature else {
            warn!("stripe_signature_missing");
            return Err(WebhookError::MissingSignature);
        };

        verify_stripe_signature(
            body,
            signature,
            &self.settings.webhook_secret,
            self.settings.signature_tolerance_secs,
        )?;

        let raw: serde_json::Value = serde_json::from_slice(body).map_err(EventError::from)?;
        let event = Event::deserialize(&raw).map_err(EventError::from)?;

        info!(
            event_id = %event.id,
            event_type = %event.event_type,
            livemode = event.livemode,
            created = event.created,
            "stripe_event_verified"
        );

        match event.event_type.as_str() {
            CHECKOUT_SESSION_COMPLETED => self.complete_checkout(&event).await?,
            other => debug!(event_id = %event.id, event_type = other, "stripe_event_ignored"),
        }

        Ok(raw)
    }
}
