//! Parley server library logic.

pub mod api_agent;
pub mod config;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use parley_voice::{AgentCoordinator, AgentRuntime, ProviderCredentials, SessionRegistry};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Starts and stops agents; owns the session registry.
    pub coordinator: AgentCoordinator,
}

impl AppState {
    /// Builds state around `runtime` with a fresh, empty registry.
    pub fn new(
        runtime: Arc<dyn AgentRuntime>,
        credentials: ProviderCredentials,
        agent_name: impl Into<String>,
    ) -> Self {
        Self {
            coordinator: AgentCoordinator::new(
                SessionRegistry::new(),
                runtime,
                credentials,
                agent_name,
            ),
        }
    }
}

/// Maximum request body size (64 KiB). Join requests carry a system prompt,
/// nothing larger.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/join-agent", post(api_agent::join_agent_handler))
        .route("/leave-agent", post(api_agent::leave_agent_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
