//! PhishGuard Scoring Server
//!
//! Loads one model artifact at startup and serves predictions over HTTP.
//!
//! - `GET  /health`          liveness and loaded model id
//! - `POST /predict`         `{"features": {...}}` → `{"label", "score"}`
//! - `POST /api/v1/check`    `{"url": "..."}` → heuristic or model verdict
//! - `GET  /api/v1/model`    artifact metadata and engine counters

mod config;
mod error;
mod handlers;


use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use phishguard_core::InferenceContext;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    init_tracing(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Startup failed: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(config: &config::Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "phishguard_server=debug,phishguard_core=info,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run(config: config::Config) -> anyhow::Result<()> {
    tracing::info!("PhishGuard server starting...");
    tracing::info!("Model: {}", config.model_path.display());

    // A server without a valid model must not come up
    let inference = InferenceContext::load(&config.model_path)
        .with_context(|| format!("cannot load model from {}", config.model_path.display()))?;

    let state = AppState {
        inference: Arc::new(inference),
        config: config.clone(),
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {}", addr))?;
    tracing::info!("🚀 Server listening on http://{}", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub inference: Arc<InferenceContext>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::predict))
        .route("/api/v1/check", post(handlers::check::check))
        .route("/api/v1/model", get(handlers::model::info))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
