//! MCP Router - routes MCP methods to the tool dispatcher
//!
//! The router implements Tower's `Service` trait, so every binding can wrap
//! it in the same middleware (tracing, JSON-RPC framing). It holds no
//! per-session state: any request may arrive at any time.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tower_service::Service;

use crate::auth::AuthInfo;
use crate::dispatch::Dispatcher;
use crate::error::{Error, JsonRpcError, Result};
use crate::protocol::*;
use crate::tool::{self, ToolCall};

const DEFAULT_INSTRUCTIONS: &str = "Weather lookups backed by Open-Meteo. \
    Use get_weather for current conditions in a city and get_forecast for a daily \
    forecast of 1 to 16 days. Both take a free-text city name; results report the \
    resolved place and its coordinates.";

/// MCP router over a [`Dispatcher`].
///
/// Implements `tower::Service<RouterRequest>`. Cloning is cheap.
#[derive(Clone)]
pub struct McpRouter {
    inner: Arc<McpRouterInner>,
}

impl std::fmt::Debug for McpRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpRouter")
            .field("server_name", &self.inner.server_name)
            .field("server_version", &self.inner.server_version)
            .finish_non_exhaustive()
    }
}

struct McpRouterInner {
    server_name: String,
    server_version: String,
    instructions: Option<String>,
    dispatcher: Dispatcher,
}

impl McpRouter {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            inner: Arc::new(McpRouterInner {
                server_name: "weather-mcp".to_string(),
                server_version: env!("CARGO_PKG_VERSION").to_string(),
                instructions: Some(DEFAULT_INSTRUCTIONS.to_string()),
                dispatcher,
            }),
        }
    }

    pub fn server_name(&self) -> &str {
        &self.inner.server_name
    }

    pub fn server_version(&self) -> &str {
        &self.inner.server_version
    }

    fn capabilities(&self) -> ServerCapabilities {
        ServerCapabilities {
            tools: Some(ToolsCapability::default()),
        }
    }

    /// Handle an MCP request
    async fn handle(&self, request: McpRequest, extensions: &Extensions) -> Result<McpResponse> {
        match request {
            McpRequest::Initialize(params) => {
                tracing::info!(
                    client = %params.client_info.name,
                    version = %params.client_info.version,
                    "Client initializing"
                );

                // Echo the client's version when supported, else offer our latest
                let protocol_version =
                    if SUPPORTED_PROTOCOL_VERSIONS.contains(&params.protocol_version.as_str()) {
                        params.protocol_version
                    } else {
                        LATEST_PROTOCOL_VERSION.to_string()
                    };

                Ok(McpResponse::Initialize(InitializeResult {
                    protocol_version,
                    capabilities: self.capabilities(),
                    server_info: Implementation {
                        name: self.inner.server_name.clone(),
                        version: self.inner.server_version.clone(),
                    },
                    instructions: self.inner.instructions.clone(),
                }))
            }

            McpRequest::ListTools(_params) => Ok(McpResponse::ListTools(ListToolsResult {
                tools: tool::catalog(),
                next_cursor: None,
            })),

            McpRequest::CallTool(params) => {
                if let Some(auth) = extensions.get::<AuthInfo>() {
                    tracing::debug!(client_id = %auth.client_id, tool = %params.name, "Authenticated tool call");
                }
                let result = self.inner.dispatcher.dispatch(ToolCall::from(params)).await;
                let is_error = !result.is_success();
                let value = serde_json::to_value(&result)?;
                Ok(McpResponse::CallTool(CallToolResult::structured(value, is_error)))
            }

            McpRequest::Ping => Ok(McpResponse::Pong(EmptyResult {})),

            McpRequest::Unknown { method, .. } => {
                Err(Error::JsonRpc(JsonRpcError::method_not_found(&method)))
            }
        }
    }

    /// Handle an MCP notification (no response expected)
    pub fn handle_notification(&self, notification: McpNotification) {
        match notification {
            McpNotification::Initialized => {
                tracing::info!("Client finished initialization");
            }
            McpNotification::Cancelled(params) => {
                // Calls are short and uncancellable; the result is simply discarded.
                tracing::debug!(
                    request_id = ?params.request_id,
                    reason = ?params.reason,
                    "Cancellation requested"
                );
            }
            McpNotification::Unknown { method, .. } => {
                tracing::debug!(method = %method, "Unknown notification received");
            }
        }
    }
}

// =============================================================================
// Tower Service implementation
// =============================================================================

/// A minimal type-map for passing data (e.g. [`AuthInfo`]) through middleware.
///
/// Values are stored behind `Arc` so cloning for batch requests stays cheap.
#[derive(Default, Clone)]
pub struct Extensions {
    map: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous value of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, val: T) {
        self.map.insert(TypeId::of::<T>(), Arc::new(val));
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|val| val.downcast_ref::<T>())
    }
}

impl std::fmt::Debug for Extensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extensions")
            .field("len", &self.map.len())
            .finish()
    }
}

/// Request type for the tower Service implementation
#[derive(Debug)]
pub struct RouterRequest {
    pub id: RequestId,
    pub inner: McpRequest,
    pub extensions: Extensions,
}

/// Response type for the tower Service implementation
#[derive(Debug)]
pub struct RouterResponse {
    pub id: RequestId,
    pub inner: std::result::Result<McpResponse, JsonRpcError>,
}

impl RouterResponse {
    /// Convert to JSON-RPC response
    pub fn into_jsonrpc(self) -> JsonRpcResponse {
        match self.inner {
            Ok(response) => match serde_json::to_value(response) {
                Ok(result) => JsonRpcResponse::result(self.id, result),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize response");
                    JsonRpcResponse::error(
                        Some(self.id),
                        JsonRpcError::internal_error(format!("Serialization error: {}", e)),
                    )
                }
            },
            Err(error) => JsonRpcResponse::error(Some(self.id), error),
        }
    }
}

impl Service<RouterRequest> for McpRouter {
    type Response = RouterResponse;
    type Error = std::convert::Infallible; // Errors are in the response
    type Future =
        Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: RouterRequest) -> Self::Future {
        let router = self.clone();
        Box::pin(async move {
            let result = router.handle(req.inner, &req.extensions).await;
            Ok(RouterResponse {
                id: req.id,
                inner: result.map_err(|e| match e {
                    Error::JsonRpc(err) => err,
                    e => JsonRpcError::internal_error(e.to_string()),
                }),
            })
        })
    }
}
