//! VPS Checkout Server
//!
//! Axum-based server selling fixed-size instances: the buyer picks a plan,
//! pays through a QR transaction, then confirms to get a running instance
//! with its address and root password.

mod config;
mod handlers;
mod orchestrator;
mod state;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vps_core::PlanCatalog;
use vps_payments::{
    PakasirClient, PakasirConfig, PaymentVerifier, TransactionService, TurnstileClient,
    TurnstileConfig,
};
use vps_runtime::{DigitalOceanClient, DigitalOceanConfig, InstanceProvisioner, ProvisionerConfig};

use crate::config::ServerConfig;
use crate::handlers::{check_status, checkout, create_transaction, health_check, list_plans};
use crate::orchestrator::Orchestrator;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    let catalog = Arc::new(PlanCatalog::builtin());

    // Payment gateway
    let pakasir_config = PakasirConfig::from_env()
        .context("Pakasir not configured (set PAKASIR_SLUG and PAKASIR_API_KEY)")?
        .with_timeout(config.call_timeout);
    let gateway = Arc::new(PakasirClient::new(pakasir_config)?);
    tracing::info!("✓ Pakasir gateway configured");

    // Presence verification
    let turnstile_config = TurnstileConfig::from_env()
        .context("Turnstile not configured (set TURNSTILE_SECRET_KEY)")?
        .with_timeout(config.call_timeout);
    let turnstile = TurnstileClient::new(turnstile_config)?;
    let site_key = turnstile.site_key().map(String::from);
    if site_key.is_none() {
        tracing::warn!("⚠ TURNSTILE_SITE_KEY not set - checkout page gets no widget key");
    }

    // Cloud provider
    let do_config = DigitalOceanConfig::from_env()
        .context("DigitalOcean not configured (set DO_API_KEY)")?
        .with_timeout(config.call_timeout);
    let cloud = Arc::new(DigitalOceanClient::new(do_config)?);
    tracing::info!("✓ DigitalOcean configured");

    let transactions = TransactionService::new(gateway.clone(), catalog.clone())
        .with_call_timeout(config.call_timeout);
    let verifier = PaymentVerifier::new(Arc::new(turnstile), gateway, catalog.clone())
        .with_call_timeout(config.call_timeout);
    let provisioner = InstanceProvisioner::with_config(
        cloud,
        catalog.clone(),
        ProvisionerConfig {
            call_timeout: config.call_timeout,
            ..ProvisionerConfig::default()
        },
    );

    tracing::info!("Serving {} plans:", catalog.len());
    for plan in catalog.plans() {
        tracing::info!("  • {} ({}) - {}", plan.key, plan.provider_size_id, plan.price);
    }

    // Build application state
    let state = AppState {
        catalog: catalog.clone(),
        transactions: Arc::new(transactions),
        orchestrator: Arc::new(Orchestrator::new(verifier, provisioner)),
        site_key,
    };

    let app = build_router(state, &config.static_dir);

    // Start server
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 vps-server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                  - Health check");
    tracing::info!("  GET  /api/plans               - Plan catalog");
    tracing::info!("  GET  /api/checkout?plan=      - Checkout data for a plan");
    tracing::info!("  POST /api/create-transaction  - Create QR payment");
    tracing::info!("  POST /api/check-status        - Confirm payment and provision");
    tracing::info!("  GET  /*                       - Static files from {}", config.static_dir.display());
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}

pub(crate) fn build_router(state: AppState, static_dir: &Path) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/health", get(health_check))
        .route("/api/plans", get(list_plans))
        .route("/api/checkout", get(checkout))

        // Orders
        .route("/api/create-transaction", post(create_transaction))
        .route("/api/check-status", post(check_status))

        // Static files (storefront)
        .fallback_service(ServeDir::new(static_dir))

        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
