//! Networked binding over HTTP
//!
//! Routes:
//!
//! - `POST /mcp`: JSON-RPC (single or batch). Guarded by [`AuthLayer`] when a
//!   bearer token is configured. Notifications are answered `202 Accepted`.
//! - `GET /mcp`, `GET /mcp/health`: liveness/info payload. No token, no
//!   provider call.
//!
//! Every request is handled independently; the only shared state is the
//! read-only endpoint and health payload.
//!
//! # Example
//!
//! ```rust,no_run
//! use weather_mcp::config::{AuthMode, BearerToken, ProviderConfig};
//! use weather_mcp::{Dispatcher, HttpTransport, McpRouter, OpenMeteo};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = OpenMeteo::new(ProviderConfig::default())?;
//!     let router = McpRouter::new(Dispatcher::new(provider));
//!     let token = BearerToken::parse("change-me").ok_or("empty token")?;
//!
//!     HttpTransport::new(router, AuthMode::Bearer(token))
//!         .serve("127.0.0.1:8000".parse()?)
//!         .await?;
//!     Ok(())
//! }
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;

use crate::auth::{AuthInfo, AuthLayer, StaticBearerValidator};
use crate::config::AuthMode;
use crate::error::{Error, Result};
use crate::router::{Extensions, McpRouter};
use crate::tool;
use crate::transport::McpEndpoint;

/// Path of the MCP endpoint
pub const MCP_PATH: &str = "/mcp";

/// Path of the dedicated health probe
pub const HEALTH_PATH: &str = "/mcp/health";

/// Body of the health/info response
#[derive(Debug, Clone, Serialize)]
pub struct HealthInfo {
    pub ok: bool,
    pub server: String,
    pub version: String,
    pub tools: Vec<&'static str>,
    pub auth_required: bool,
}

struct AppState {
    endpoint: McpEndpoint,
    health: HealthInfo,
}

/// HTTP transport wrapping an MCP router
pub struct HttpTransport {
    router: McpRouter,
    auth: AuthMode,
}

impl HttpTransport {
    pub fn new(router: McpRouter, auth: AuthMode) -> Self {
        Self { router, auth }
    }

    /// Build the axum router for this transport
    pub fn into_router(self) -> Router {
        let health = HealthInfo {
            ok: true,
            server: self.router.server_name().to_string(),
            version: self.router.server_version().to_string(),
            tools: tool::tool_names(),
            auth_required: self.auth.is_required(),
        };
        let state = Arc::new(AppState {
            endpoint: McpEndpoint::new(self.router),
            health,
        });

        let rpc = match &self.auth {
            AuthMode::Bearer(token) => {
                post(handle_post).route_layer(AuthLayer::new(StaticBearerValidator::new(token.clone())))
            }
            AuthMode::Open => post(handle_post),
        };

        Router::new()
            .route(MCP_PATH, rpc.get(handle_health))
            .route(HEALTH_PATH, get(handle_health))
            .with_state(state)
    }

    /// Bind `addr` and serve until Ctrl-C.
    pub async fn serve(self, addr: SocketAddr) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Transport(format!("Failed to bind to {}: {}", addr, e)))?;

        match &self.auth {
            AuthMode::Bearer(_) => {
                tracing::info!(%addr, path = MCP_PATH, "MCP HTTP transport listening (bearer auth)")
            }
            AuthMode::Open => tracing::warn!(
                %addr,
                path = MCP_PATH,
                "MCP HTTP transport listening WITHOUT authentication; anyone who can reach this port can call tools"
            ),
        }

        let router = self.into_router();
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Transport(format!("Server error: {}", e)))?;

        tracing::info!("MCP HTTP transport stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Handle POST requests (JSON-RPC messages from client)
async fn handle_post(
    State(state): State<Arc<AppState>>,
    auth: Option<Extension<AuthInfo>>,
    body: String,
) -> Response {
    let mut extensions = Extensions::new();
    if let Some(Extension(info)) = auth {
        extensions.insert(info);
    }

    match state.endpoint.handle_text(&body, extensions).await {
        Some(message) => Json(message).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Handle health probes
async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthInfo> {
    Json(state.health.clone())
}
