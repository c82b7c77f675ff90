//! Webhook error kinds and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::mail::MailError;
use crate::orders::StoreError;
use crate::stripe::{EventError, SignatureError};

/// Body returned by the missing-header rejection.
pub const INVALID_SIGNATURE_MESSAGE: &str = "Invalid signature";

/// Body message for every other failure.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong";

/// Everything that can go wrong while handling a delivery.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing Stripe-Signature header")]
    MissingSignature,
    #[error("signature verification failed: {0}")]
    BadSignature(#[from] SignatureError),
    #[error("invalid event payload: {0}")]
    InvalidEventPayload(#[from] EventError),
    #[error("order {0} not found")]
    OrderNotFound(String),
    #[error("persistence failure: {0}")]
    Persistence(StoreError),
    #[error("email delivery failure: {0}")]
    EmailDelivery(#[from] MailError),
}

impl From<StoreError> for WebhookError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::OrderNotFound(id) => WebhookError::OrderNotFound(id),
            other => WebhookError::Persistence(other),
        }
    }
}

impl WebhookError {
    /// Stable machine-readable name, included in JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            WebhookError::MissingSignature => "missing_signature",
            WebhookError::BadSignature(_) => "bad_signature",
            WebhookError::InvalidEventPayload(_) => "invalid_event_payload",
            WebhookError::OrderNotFound(_) => "order_not_found",
            WebhookError::Persistence(_) => "persistence_failure",
            WebhookError::EmailDelivery(_) => "email_delivery_failure",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            WebhookError::MissingSignature | WebhookError::BadSignature(_) => {
                StatusCode::BAD_REQUEST
            }
            // Stripe redelivers on 5xx
            WebhookError::InvalidEventPayload(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WebhookError::OrderNotFound(_) => StatusCode::NOT_FOUND,
            WebhookError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WebhookError::EmailDelivery(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: &'static str,
    pub ok: bool,
    pub error: &'static str,
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            WebhookError::MissingSignature => (status, INVALID_SIGNATURE_MESSAGE).into_response(),
            WebhookError::BadSignature(_) => (
                status,
                Json(ErrorResponse {
                    message: INVALID_SIGNATURE_MESSAGE,
                    ok: false,
                    error: self.kind(),
                }),
            )
                .into_response(),
            _ => (
                status,
                Json(ErrorResponse {
                    message: GENERIC_FAILURE_MESSAGE,
                    ok: false,
                    error: self.kind(),
                }),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_conversion() {
        let err: WebhookError = StoreError::OrderNotFound("o1".to_string()).into();
        assert!(matches!(err, WebhookError::OrderNotFound(ref id) if id == "o1"));

        let err: WebhookError = StoreError::Unavailable("down".to_string()).into();
        assert!(matches!(err, WebhookError::Persistence(_)));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(WebhookError::MissingSignature.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            WebhookError::BadSignature(SignatureError::Mismatch).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::InvalidEventPayload(EventError::MissingEmail).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            WebhookError::OrderNotFound("o1".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            WebhookError::Persistence(StoreError::Unavailable("down".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            WebhookError::EmailDelivery(MailError::Rejected {
                status: 401,
                body: String::new(),
            })
            .status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_missing_signature_response_is_plain_text() {
        let response = WebhookError::MissingSignature.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let content_type = response.headers().get("content-type").unwrap();
        assert!(content_type.to_str().unwrap().starts_with("text/plain"));
    }
}
