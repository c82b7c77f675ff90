//! HTTP endpoint handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::error::WebhookError;
use crate::process::WebhookProcessor;
use crate::stripe::STRIPE_SIGNATURE_HEADER;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<WebhookProcessor>,
}

impl AppState {
    pub fn new(processor: WebhookProcessor) -> Self {
        Self {
            processor: Arc::new(processor),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Stripe Webhook
// =============================================================================

/// Successful webhook response: the event echoed back.
#[derive(Serialize)]
pub struct WebhookResponse {
    pub result: serde_json::Value,
    pub ok: bool,
}

/// Stripe webhook endpoint.
///
/// Takes the body as raw bytes; re-serializing JSON would break the signature.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, WebhookError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.trim().is_empty());

    match state.processor.handle(&body, signature).await {
        Ok(event) => Ok(Json(WebhookResponse {
            result: event,
            ok: true,
        })),
        Err(e) => {
            if e.status().is_server_error() {
                error!(error = %e, kind = e.kind(), "stripe_webhook_failed");
            } else {
                warn!(error = %e, kind = e.kind(), "stripe_webhook_rejected");
            }
            Err(e)
        }
    }
}
