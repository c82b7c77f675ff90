//! SendGrid v3 mail client.
//!
//! Reference: https://www.twilio.com/docs/sendgrid/api-reference/mail-send/mail-send

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{info, warn};
use url::Url;

use super::message::{EmailMessage, MailError, Mailer};

const MAIL_SEND_PATH: &str = "/v3/mail/send";

/// Longest provider error body kept in [`MailError::Rejected`].
const MAX_ERROR_BODY: usize = 500;

/// Sends email through the SendGrid HTTP API.
#[derive(Clone)]
pub struct SendGridMailer {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl SendGridMailer {
    /// Create a mailer for `base_url` (normally `https://api.sendgrid.com`).
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self, MailError> {
        let endpoint = Url::parse(base_url)?.join(MAIL_SEND_PATH)?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_body(message: &EmailMessage) -> serde_json::Value {
        json!({
            "personalizations": [{ "to": [{ "email": message.to }] }],
            "from": message.from,
            "subject": message.subject,
            "content": [{ "type": "text/html", "value": message.html }],
        })
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&Self::request_body(message))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!(
                to = %message.to,
                status = status.as_u16(),
                "sendgrid_message_accepted"
            );
            return Ok(());
        }

        let body: String = response
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(MAX_ERROR_BODY)
            .collect();

        warn!(
            to = %message.to,
            status = status.as_u16(),
            "sendgrid_message_rejected"
        );

        Err(MailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
