//! Error types for weather-mcp
//!
//! Two layers of errors live here:
//!
//! - Protocol errors ([`JsonRpcError`], [`Error`]) describe failures of the
//!   JSON-RPC envelope or the transport itself.
//! - Tool errors ([`ToolError`]) describe why a single tool call failed. They
//!   never cross the transport as protocol errors; the dispatcher folds them
//!   into a [`ToolResult`](crate::model::ToolResult).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Standard JSON-RPC error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    /// Invalid JSON was received
    ParseError = -32700,
    /// The JSON sent is not a valid Request object
    InvalidRequest = -32600,
    /// The method does not exist / is not available
    MethodNotFound = -32601,
    /// Invalid method parameter(s)
    InvalidParams = -32602,
    /// Internal JSON-RPC error
    InternalError = -32603,
    /// Missing or rejected bearer token (server-defined range)
    Unauthorized = -32001,
}

impl ErrorCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            ErrorCode::MethodNotFound,
            format!("Method not found: {}", method),
        )
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
            .with_data(serde_json::json!({ "kind": ToolErrorKind::Authentication }))
    }
}

/// weather-mcp error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("JSON-RPC error: {0:?}")]
    JsonRpc(JsonRpcError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<JsonRpcError> for Error {
    fn from(err: JsonRpcError) -> Self {
        Error::JsonRpc(err)
    }
}

/// Result type alias for weather-mcp
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error used at the binary boundary
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// Tool errors
// =============================================================================

/// Stable classification of a failed tool call.
///
/// The serialized names are part of the wire contract and never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolErrorKind {
    /// Bad, missing or out-of-range arguments. No provider call was made.
    #[serde(rename = "ValidationError")]
    Validation,
    /// The city resolved to zero matches.
    #[serde(rename = "NotFoundError")]
    NotFound,
    /// Provider unreachable, timed out, or answered with a non-success status.
    #[serde(rename = "UpstreamError")]
    Upstream,
    /// Provider answered successfully but required fields are missing.
    #[serde(rename = "MalformedResponseError")]
    MalformedResponse,
    /// The tool name is not in the catalog.
    #[serde(rename = "UnknownToolError")]
    UnknownTool,
    /// Missing or invalid bearer token (networked binding only).
    #[serde(rename = "AuthenticationError")]
    Authentication,
}

impl ToolErrorKind {
    /// The stable wire tag for this kind
    pub fn as_str(self) -> &'static str {
        match self {
            ToolErrorKind::Validation => "ValidationError",
            ToolErrorKind::NotFound => "NotFoundError",
            ToolErrorKind::Upstream => "UpstreamError",
            ToolErrorKind::MalformedResponse => "MalformedResponseError",
            ToolErrorKind::UnknownTool => "UnknownToolError",
            ToolErrorKind::Authentication => "AuthenticationError",
        }
    }
}

impl fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed tool failure: a stable kind tag plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NotFound, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Upstream, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::MalformedResponse, message)
    }

    pub fn unknown_tool(name: &str) -> Self {
        Self::new(
            ToolErrorKind::UnknownTool,
            format!("Unknown tool: {}", name),
        )
    }
}
