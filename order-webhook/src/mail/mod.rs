//! Transactional email.
//!
//! ## Flow
//!
//! ```text
//! PaidOrder → EmailRenderer → EmailMessage → Mailer (SendGrid)
//! ```

pub mod message;
pub mod sendgrid;
pub mod template;

pub use message::{EmailMessage, MailError, Mailer, Sender, ORDER_CONFIRMATION_SUBJECT};
pub use sendgrid::SendGridMailer;
pub use template::{EmailRenderer, OrderReceivedEmail};
