//! MCP request tracing middleware.
//!
//! [`McpTracingLayer`] wraps the router in every binding and opens one
//! `mcp_request` span per JSON-RPC request with these fields:
//!
//! - `method` (e.g. `tools/call`)
//! - `request_id`
//! - `operation` / `target` (for tool calls: `tool` and the tool name)
//!
//! Completion is logged with `duration_ms`. Protocol errors are logged at
//! `WARN`, as are tool results flagged `isError` (with the error kind).
//! Lifecycle chatter (`initialize`, `ping`, `tools/list`) completes at
//! `DEBUG`; tool calls complete at `INFO`.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tower::Layer;
use tower_service::Service;
use tracing::Instrument;

use crate::protocol::{McpRequest, McpResponse};
use crate::router::{RouterRequest, RouterResponse};

/// Tower layer that adds structured tracing to MCP requests.
#[derive(Debug, Clone, Copy, Default)]
pub struct McpTracingLayer {
    _priv: (),
}

impl McpTracingLayer {
    pub fn new() -> Self {
        Self { _priv: () }
    }
}

impl<S> Layer<S> for McpTracingLayer {
    type Service = McpTracingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        McpTracingService { inner }
    }
}

/// Tower service that adds tracing to MCP requests.
///
/// Created by [`McpTracingLayer`].
#[derive(Debug, Clone)]
pub struct McpTracingService<S> {
    inner: S,
}

impl<S> Service<RouterRequest> for McpTracingService<S>
where
    S: Service<RouterRequest, Response = RouterResponse, Error = Infallible>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    type Response = RouterResponse;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<RouterResponse, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: RouterRequest) -> Self::Future {
        let method = req.inner.method_name().to_string();
        let (operation, target) = operation_details(&req.inner);
        let is_tool_call = matches!(req.inner, McpRequest::CallTool(_));

        let span = tracing::info_span!(
            "mcp_request",
            method = %method,
            request_id = ?req.id,
            operation,
            target = target.as_deref(),
        );

        let start = Instant::now();
        let fut = self.inner.call(req);

        Box::pin(
            async move {
                let result = fut.await;
                let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

                if let Ok(response) = &result {
                    match &response.inner {
                        Ok(McpResponse::CallTool(call)) if call.is_error => {
                            let kind = call
                                .structured_content
                                .as_ref()
                                .and_then(|v| v.pointer("/error/kind"))
                                .and_then(|v| v.as_str())
                                .unwrap_or("unknown");
                            tracing::warn!(method = %method, kind, duration_ms, "Tool returned error result");
                        }
                        Ok(_) if is_tool_call => {
                            tracing::info!(method = %method, duration_ms, "MCP request completed");
                        }
                        Ok(_) => {
                            tracing::debug!(method = %method, duration_ms, "MCP request completed");
                        }
                        Err(err) => {
                            tracing::warn!(
                                method = %method,
                                error_code = err.code,
                                error_message = %err.message,
                                duration_ms,
                                "MCP request failed"
                            );
                        }
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}

/// Operation name and target for the span.
fn operation_details(req: &McpRequest) -> (&'static str, Option<String>) {
    match req {
        McpRequest::CallTool(params) => ("tool", Some(params.name.clone())),
        McpRequest::ListTools(_) => ("list", Some("tools".to_string())),
        McpRequest::Initialize(params) => ("init", Some(params.client_info.name.clone())),
        McpRequest::Ping => ("ping", None),
        McpRequest::Unknown { method, .. } => ("unknown", Some(method.clone())),
    }
}
