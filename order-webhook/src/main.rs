//! CaseCraft webhook server.
//!
//! Receives Stripe checkout webhooks, marks orders paid in Postgres and
//! sends order confirmations through SendGrid.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use casecraft::{
    router, AppState, Config, PgOrderStore, ProcessorSettings, SendGridMailer, WebhookProcessor,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env();
    let settings = ProcessorSettings::from_config(&config).context("Invalid configuration")?;
    info!(
        port = config.port,
        signature_tolerance_secs = config.stripe_signature_tolerance_secs,
        sendgrid_api_url = %config.sendgrid_api_url,
        email_from = %config.email_from_address,
        run_migrations = config.run_migrations,
        "config_loaded"
    );

    // Connect to Postgres
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    info!(max_connections = config.database_max_connections, "database_connected");

    let store = PgOrderStore::new(pool);
    if config.run_migrations {
        store.migrate().await.context("Failed to run migrations")?;
    }

    let mailer = SendGridMailer::new(
        &config.sendgrid_api_url,
        config.sendgrid_api_key.clone().unwrap_or_default(),
        Duration::from_millis(config.request_timeout_ms),
    )
    .context("Failed to create SendGrid client")?;

    let processor = WebhookProcessor::new(settings, Arc::new(store.clone()), Arc::new(mailer))
        .context("Failed to load email templates")?;
    let app = router(AppState::new(processor));

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    store.close().await;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
