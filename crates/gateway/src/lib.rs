//! HTTP gateway for GenWeb.
//!
//! Routes:
//! - `GET /api/generate`: stream a generated page as `text/html`
//! - `GET /health`: liveness
//! - everything else: the static front-end
//!
//! Built on Axum; one relay task per generation request.

pub mod frontend;
pub mod generate;
mod relay;

use std::sync::Arc;

use axum::{Router, middleware, response::Json, routing::get};
use genweb_core::Provider;
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub config: genweb_config::AppConfig,
    pub provider: Arc<dyn Provider>,
    pub model: String,
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    let static_dir = state.config.gateway.static_dir.clone();

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/generate", get(generate::generate_handler))
        .fallback_service(frontend::serve_dir(&static_dir))
        .layer(middleware::from_fn(frontend::script_content_type))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
pub async fn start(config: genweb_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let router = genweb_providers::router::build_from_config(&config);
    let provider = router
        .default()
        .ok_or_else(|| format!("Provider '{}' is not available", config.default_provider))?;

    if !config.has_api_key() {
        warn!("No API key configured, generation requests may fail");
    }
    if !config.gateway.static_dir.is_dir() {
        warn!(
            path = %config.gateway.static_dir.display(),
            "Static directory not found, front-end will not be served"
        );
    }

    let model = config.active_model().to_string();
    info!(
        addr = %addr,
        provider = %provider.name(),
        model = %model,
        agents_file = %config.gateway.agents_file.display(),
        "Gateway starting"
    );

    let state = Arc::new(GatewayState {
        config,
        provider,
        model,
    });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, build_router(state)).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
