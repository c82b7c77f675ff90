//! Order confirmation rendering.

use chrono::{DateTime, Utc};
use tera::{Context, Tera};

use super::message::MailError;
use crate::orders::Address;

const ORDER_RECEIVED_TEMPLATE: &str = "order_received.html";
const ORDER_RECEIVED_SOURCE: &str = include_str!("../../templates/order_received.html");

/// Values shown in the order confirmation.
#[derive(Debug)]
pub struct OrderReceivedEmail<'a> {
    pub order_id: &'a str,
    pub order_date: DateTime<Utc>,
    pub customer_name: &'a str,
    pub shipping: &'a Address,
}

/// Holds the compiled templates. Values are HTML-escaped.
pub struct EmailRenderer {
    tera: Tera,
}

impl EmailRenderer {
    pub fn new() -> Result<Self, MailError> {
        let mut tera = Tera::default();
        tera.add_raw_template(ORDER_RECEIVED_TEMPLATE, ORDER_RECEIVED_SOURCE)?;
        Ok(Self { tera })
    }

    pub fn render_order_received(&self, email: &OrderReceivedEmail<'_>) -> Result<String, MailError> {
        let mut context = Context::new();
        context.insert("order_id", email.order_id);
        context.insert("order_date", &email.order_date.format("%B %-d, %Y").to_string());
        context.insert("customer_name", email.customer_name);
        context.insert("shipping", email.shipping);

        Ok(self.tera.render(ORDER_RECEIVED_TEMPLATE, &context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn shipping() -> Address {
        Address {
            id: Uuid::nil(),
            name: "A B".to_string(),
            street: "1 Main St".to_string(),
            city: "Oakland".to_string(),
            postal_code: "94607".to_string(),
            country: "US".to_string(),
            state: "CA".to_string(),
        }
    }

    #[test]
    fn test_render_order_received() {
        let renderer = EmailRenderer::new().unwrap();
        let shipping = shipping();
        let html = renderer
            .render_order_received(&OrderReceivedEmail {
                order_id: "o1",
                order_date: Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap(),
                customer_name: "A B",
                shipping: &shipping,
            })
            .unwrap();

        assert!(html.contains("o1"));
        assert!(html.contains("June 3, 2024"));
        assert!(html.contains("1 Main St"));
        assert!(html.contains("Oakland, CA 94607"));
    }

    #[test]
    fn test_render_escapes_html() {
        let renderer = EmailRenderer::new().unwrap();
        let mut shipping = shipping();
        shipping.name = "<script>alert(1)</script>".to_string();

        let html = renderer
            .render_order_received(&OrderReceivedEmail {
                order_id: "o1",
                order_date: Utc::now(),
                customer_name: "A & B",
                shipping: &shipping,
            })
            .unwrap();

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("A &amp; B"));
    }
}
