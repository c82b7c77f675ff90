//! Outbound email types and the [`Mailer`] seam.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Subject line of the order confirmation.
pub const ORDER_CONFIRMATION_SUBJECT: &str = "Thanks for your order!";

/// Email delivery and rendering failures.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("failed to render email: {0}")]
    Render(#[from] tera::Error),
    #[error("invalid email provider url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("email provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("email provider rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Sender identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sender {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A single rendered email, discarded after one send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub from: Sender,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}
