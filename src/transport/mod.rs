//! Transport bindings
//!
//! Both bindings share one [`McpEndpoint`] and differ only in framing:
//!
//! - `stdio` - line-delimited JSON-RPC over stdin/stdout, no authentication
//! - `http` - `POST /mcp` with bearer-token auth plus an open health probe
//!   (requires `http` feature)
//!
//! The endpoint decodes raw JSON, answers parse errors, consumes
//! notifications and forwards requests through the tracing layer into the
//! router.

use serde_json::Value;
use tower::Layer;

use crate::error::JsonRpcError;
use crate::jsonrpc::JsonRpcService;
use crate::protocol::{
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, JsonRpcResponseMessage, McpNotification,
};
use crate::router::{Extensions, McpRouter};
use crate::tracing_layer::{McpTracingLayer, McpTracingService};

pub mod stdio;

#[cfg(feature = "http")]
pub mod http;

pub use stdio::StdioTransport;

#[cfg(feature = "http")]
pub use http::HttpTransport;

/// Transport-independent JSON-RPC entry point.
#[derive(Debug, Clone)]
pub struct McpEndpoint {
    router: McpRouter,
    service: JsonRpcService<McpTracingService<McpRouter>>,
}

impl McpEndpoint {
    pub fn new(router: McpRouter) -> Self {
        let service = JsonRpcService::new(McpTracingLayer::new().layer(router.clone()));
        Self { router, service }
    }

    /// Handle one raw message. `None` means nothing is sent back
    /// (notifications, or a batch made only of notifications).
    pub async fn handle_text(&self, text: &str, extensions: Extensions) -> Option<JsonRpcResponseMessage> {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => self.handle_value(value, extensions).await,
            Err(e) => Some(JsonRpcResponseMessage::Single(JsonRpcResponse::error(
                None,
                JsonRpcError::parse_error(format!("Invalid JSON: {}", e)),
            ))),
        }
    }

    /// Handle one decoded message.
    pub async fn handle_value(&self, value: Value, extensions: Extensions) -> Option<JsonRpcResponseMessage> {
        let mut service = self.service.clone().with_extensions(extensions);

        match value {
            Value::Array(items) => {
                if items.is_empty() {
                    return Some(JsonRpcResponseMessage::Single(JsonRpcResponse::error(
                        None,
                        JsonRpcError::invalid_request("Empty batch request"),
                    )));
                }

                let mut requests = Vec::new();
                let mut rejected = Vec::new();
                for item in items {
                    match self.classify(item) {
                        Incoming::Request(req) => requests.push(req),
                        Incoming::Invalid(resp) => rejected.push(resp),
                        Incoming::Notification => {}
                    }
                }

                let mut responses = if requests.is_empty() {
                    Vec::new()
                } else {
                    service.call_batch(requests).await.unwrap_or_default()
                };
                responses.extend(rejected);

                if responses.is_empty() {
                    None
                } else {
                    Some(JsonRpcResponseMessage::Batch(responses))
                }
            }
            single => match self.classify(single) {
                Incoming::Request(req) => {
                    Some(JsonRpcResponseMessage::Single(service.call_single(req).await))
                }
                Incoming::Invalid(resp) => Some(JsonRpcResponseMessage::Single(resp)),
                Incoming::Notification => None,
            },
        }
    }

    /// Sort one batch element into request, notification or invalid.
    fn classify(&self, value: Value) -> Incoming {
        if !value.is_object() {
            return Incoming::Invalid(JsonRpcResponse::error(
                None,
                JsonRpcError::invalid_request("Message must be a JSON object"),
            ));
        }

        if value.get("id").is_none() {
            match serde_json::from_value::<JsonRpcNotification>(value) {
                Ok(notification) => match McpNotification::from_jsonrpc(&notification) {
                    Ok(parsed) => self.router.handle_notification(parsed),
                    Err(e) => tracing::debug!(error = %e, "Ignoring malformed notification"),
                },
                Err(e) => tracing::debug!(error = %e, "Ignoring malformed notification"),
            }
            return Incoming::Notification;
        }

        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(req) => Incoming::Request(req),
            Err(e) => Incoming::Invalid(JsonRpcResponse::error(
                None,
                JsonRpcError::invalid_request(format!("Invalid request: {}", e)),
            )),
        }
    }
}

enum Incoming {
    Request(JsonRpcRequest),
    Notification,
    Invalid(JsonRpcResponse),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Dispatcher;
    use crate::dispatch::tests::FakeProvider;
    use serde_json::json;

    fn endpoint() -> McpEndpoint {
        McpEndpoint::new(McpRouter::new(Dispatcher::new(FakeProvider::default())))
    }

    fn single(message: Option<JsonRpcResponseMessage>) -> JsonRpcResponse {
        match message {
            Some(JsonRpcResponseMessage::Single(resp)) => resp,
            other => panic!("Expected single response, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_parse_error() {
        let resp = single(endpoint().handle_text("{not json", Extensions::new()).await);
        assert_eq!(resp.error_value().unwrap().code, -32700);
    }

    #[tokio::test]
    async fn test_notification_has_no_response() {
        let message = endpoint()
            .handle_text(
                r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
                Extensions::new(),
            )
            .await;
        assert!(message.is_none());
    }

    #[tokio::test]
    async fn test_batch_skips_notifications() {
        let message = endpoint()
            .handle_value(
                json!([
                    {"jsonrpc": "2.0", "method": "notifications/initialized"},
                    {"jsonrpc": "2.0", "id": 1, "method": "ping"},
                    {"jsonrpc": "2.0", "id": 2, "method": "tools/list"}
                ]),
                Extensions::new(),
            )
            .await;
        match message {
            Some(JsonRpcResponseMessage::Batch(responses)) => assert_eq!(responses.len(), 2),
            other => panic!("Expected batch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_batch_is_invalid() {
        let resp = single(endpoint().handle_value(json!([]), Extensions::new()).await);
        assert_eq!(resp.error_value().unwrap().code, -32600);
    }

    #[tokio::test]
    async fn test_non_object_is_invalid() {
        let resp = single(endpoint().handle_value(json!(42), Extensions::new()).await);
        assert_eq!(resp.error_value().unwrap().code, -32600);
    }
}
