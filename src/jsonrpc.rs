//! JSON-RPC 2.0 service layer
//!
//! [`JsonRpcService`] turns JSON-RPC requests into [`RouterRequest`]s for an
//! inner MCP service and converts the answers back:
//!
//! - JSON-RPC version validation
//! - MCP method/params parsing (bad params become `-32602`)
//! - Batch processing, with every request in the batch run concurrently
//!
//! Notification handling and raw-JSON decoding live in the transports.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tower::Layer;
use tower_service::Service;

use crate::error::{Error, JsonRpcError, Result};
use crate::protocol::{
    JsonRpcMessage, JsonRpcRequest, JsonRpcResponse, JsonRpcResponseMessage, McpRequest,
};
use crate::router::{Extensions, RouterRequest, RouterResponse};

/// Tower layer that adds JSON-RPC 2.0 framing to an MCP service.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRpcLayer {
    _priv: (),
}

impl JsonRpcLayer {
    pub fn new() -> Self {
        Self { _priv: () }
    }
}

impl<S> Layer<S> for JsonRpcLayer {
    type Service = JsonRpcService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        JsonRpcService::new(inner)
    }
}

/// Service that handles JSON-RPC framing.
///
/// `extensions` are copied into every [`RouterRequest`] this service builds,
/// which is how the HTTP binding hands the authenticated identity down.
#[derive(Debug, Clone)]
pub struct JsonRpcService<S> {
    inner: S,
    extensions: Extensions,
}

impl<S> JsonRpcService<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            extensions: Extensions::new(),
        }
    }

    /// Attach request-scoped data for every request sent through this service
    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }
}

impl<S> JsonRpcService<S>
where
    S: Service<RouterRequest, Response = RouterResponse, Error = Infallible>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    /// Process a single JSON-RPC request
    pub async fn call_single(&mut self, req: JsonRpcRequest) -> JsonRpcResponse {
        process_single_request(self.inner.clone(), req, self.extensions.clone()).await
    }

    /// Process a batch of JSON-RPC requests concurrently.
    ///
    /// Responses come back in request order. An empty batch is an invalid request.
    pub async fn call_batch(&mut self, requests: Vec<JsonRpcRequest>) -> Result<Vec<JsonRpcResponse>> {
        if requests.is_empty() {
            return Err(Error::JsonRpc(JsonRpcError::invalid_request(
                "Empty batch request",
            )));
        }

        let futures: Vec<_> = requests
            .into_iter()
            .map(|req| process_single_request(self.inner.clone(), req, self.extensions.clone()))
            .collect();

        Ok(futures::future::join_all(futures).await)
    }

    /// Process a JSON-RPC message (single or batch)
    pub async fn call_message(&mut self, msg: JsonRpcMessage) -> JsonRpcResponseMessage {
        match msg {
            JsonRpcMessage::Single(req) => JsonRpcResponseMessage::Single(self.call_single(req).await),
            JsonRpcMessage::Batch(requests) => match self.call_batch(requests).await {
                Ok(responses) => JsonRpcResponseMessage::Batch(responses),
                Err(Error::JsonRpc(err)) => {
                    JsonRpcResponseMessage::Single(JsonRpcResponse::error(None, err))
                }
                Err(e) => JsonRpcResponseMessage::Single(JsonRpcResponse::error(
                    None,
                    JsonRpcError::internal_error(e.to_string()),
                )),
            },
        }
    }
}

impl<S> Service<JsonRpcMessage> for JsonRpcService<S>
where
    S: Service<RouterRequest, Response = RouterResponse, Error = Infallible>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    type Response = JsonRpcResponseMessage;
    type Error = Infallible;
    type Future =
        Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, msg: JsonRpcMessage) -> Self::Future {
        let mut this = self.clone();
        Box::pin(async move { Ok(this.call_message(msg).await) })
    }
}

/// Validate, parse and route one request. Never fails: every problem becomes
/// a JSON-RPC error response carrying the request id.
async fn process_single_request<S>(
    mut inner: S,
    req: JsonRpcRequest,
    extensions: Extensions,
) -> JsonRpcResponse
where
    S: Service<RouterRequest, Response = RouterResponse, Error = Infallible> + Send + 'static,
    S::Future: Send,
{
    if let Err(e) = req.validate() {
        return JsonRpcResponse::error(Some(req.id), e);
    }

    let mcp_request = match McpRequest::from_jsonrpc(&req) {
        Ok(r) => r,
        Err(e) => return JsonRpcResponse::error(Some(req.id), e),
    };

    let router_req = RouterRequest {
        id: req.id,
        inner: mcp_request,
        extensions,
    };

    let Ok(response) = inner.call(router_req).await;
    response.into_jsonrpc()
}
