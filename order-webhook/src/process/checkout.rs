//! `checkout.session.completed` handling.

use chrono::Utc;
use tracing::{info, warn};

use super::WebhookProcessor;
use crate::error::WebhookError;
use crate::mail::{EmailMessage, OrderReceivedEmail, ORDER_CONFIRMATION_SUBJECT};
use crate::orders::{PaidCheckout, PaidOrder, PaymentOutcome};
use crate::stripe::Event;

impl WebhookProcessor {
    /// Settle the order behind a completed checkout and send the confirmation.
    ///
    /// Email failures are logged and swallowed; the order stays paid.
    pub(crate) async fn complete_checkout(&self, event: &Event) -> Result<(), WebhookError> {
        let session = event.checkout_session()?;
        let checkout = session.into_paid_checkout().inspect_err(|e| {
            warn!(event_id = %event.id, error = %e, "checkout_session_invalid");
        })?;

        let paid = match self.store.mark_paid(&checkout).await? {
            PaymentOutcome::Paid(paid) => paid,
            PaymentOutcome::AlreadyPaid(order) => {
                info!(
                    event_id = %event.id,
                    order_id = %order.id,
                    "order_already_paid"
                );
                return Ok(());
            }
        };

        if paid.order.user_id != checkout.user_id {
            warn!(
                order_id = %paid.order.id,
                order_user_id = %paid.order.user_id,
                metadata_user_id = %checkout.user_id,
                "order_user_mismatch"
            );
        }

        info!(
            event_id = %event.id,
            session_id = %checkout.session_id,
            order_id = %paid.order.id,
            "order_marked_paid"
        );

        if let Err(e) = self.send_confirmation(&checkout, &paid).await {
            warn!(
                order_id = %paid.order.id,
                to = %checkout.customer_email,
                error = %e,
                kind = e.kind(),
                "order_confirmation_failed"
            );
        }

        Ok(())
    }

    async fn send_confirmation(
        &self,
        checkout: &PaidCheckout,
        paid: &PaidOrder,
    ) -> Result<(), WebhookError> {
        let html = self.renderer.render_order_received(&OrderReceivedEmail {
            order_id: &paid.order.id,
            order_date: paid.order.paid_at.unwrap_or_else(Utc::now),
            customer_name: &checkout.customer_name,
            shipping: &paid.shipping,
        })?;

        let message = EmailMessage {
            to: checkout.customer_email.clone(),
            from: self.settings.sender.clone(),
            subject: ORDER_CONFIRMATION_SUBJECT.to_string(),
            html,
        };

        info!(
            order_id = %paid.order.id,
            to = %message.to,
            html_length = message.html.len(),
            "order_confirmation_sending"
        );

        self.mailer.send(&message).await?;

        info!(order_id = %paid.order.id, "order_confirmation_sent");
        Ok(())
    }
}
