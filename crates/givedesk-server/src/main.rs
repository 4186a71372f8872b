//! givedesk HTTP Server
//!
//! Axum-based server for the donation form and the QR widget:
//! creates Stripe payment intents, receives Stripe webhooks, emails the
//! board, renders QR codes, and serves the WASM frontend.

mod config;
mod handlers;
mod routes;
mod state;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use givedesk_payments::{LogNotifier, NotificationTemplate, Notifier, SendGridNotifier, StripeClient};

use crate::config::ServerConfig;
use crate::state::AppState;

/// Placeholder recipient when no board inbox is configured (log-only mode)
const UNCONFIGURED_BOARD_EMAIL: &str = "board@localhost";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment first so RUST_LOG from .env applies
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    // Payments
    let stripe = StripeClient::from_env().ok();
    if stripe.is_some() {
        tracing::info!("✓ Stripe configured");
    } else {
        tracing::warn!("⚠ Stripe not configured - payments disabled");
        tracing::warn!("  Set STRIPE_SECRET_KEY and STRIPE_WEBHOOK_SECRET in .env");
    }

    // Notifications
    let notifier = build_notifier(&config);
    tracing::info!("Email backend: {}", notifier.name());

    let templates = NotificationTemplate::new(
        config
            .board_email
            .clone()
            .unwrap_or_else(|| UNCONFIGURED_BOARD_EMAIL.into()),
        config.sender.clone(),
    );

    let state = AppState {
        stripe: stripe.map(Arc::new),
        notifier,
        templates: Arc::new(templates),
        intent_options: Arc::new(config.intent_options.clone()),
        notify_on_intent: config.notify_on_intent,
    };

    let app = routes::router(state, &config.static_dir);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 givedesk server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                    - Health check");
    tracing::info!("  POST /api/create-payment-intent - Start a donation");
    tracing::info!("  POST /api/webhook               - Stripe webhook");
    tracing::info!("  GET  /api/qr                    - Render QR code (png/svg)");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}

/// SendGrid when both the API key and the board inbox are set, otherwise log-only
fn build_notifier(config: &ServerConfig) -> Arc<dyn Notifier> {
    match (SendGridNotifier::from_env(), config.board_email.as_ref()) {
        (Ok(sendgrid), Some(_)) => {
            tracing::info!("✓ SendGrid configured");
            Arc::new(sendgrid)
        }
        (Ok(_), None) => {
            tracing::warn!("⚠ BOARD_EMAIL not set - notifications will only be logged");
            Arc::new(LogNotifier)
        }
        (Err(e), _) => {
            tracing::warn!("⚠ SendGrid not configured ({}) - notifications will only be logged", e);
            Arc::new(LogNotifier)
        }
    }
}
