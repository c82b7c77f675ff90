//! Web server module for the Stripe webhook endpoint.
//!
//! Routes:
//! - `GET /health`
//! - `POST /webhooks`

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{health, stripe_webhook, AppState, HealthResponse, WebhookResponse};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhooks", post(stripe_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
