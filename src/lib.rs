//! # weather-mcp
//!
//! An MCP server exposing two read-only tools backed by the public
//! [Open-Meteo](https://open-meteo.com) APIs:
//!
//! - `get_weather` - current conditions for a city
//! - `get_forecast` - a daily forecast of 1 to 16 days for a city
//!
//! Both tools resolve a free-text city name through the geocoding API and then
//! query the forecast API with the resolved coordinates. Raw provider payloads
//! are normalized into typed reports ([`model::CurrentReport`],
//! [`model::ForecastReport`]); every failure is reported as a typed
//! [`ToolError`] inside a [`model::ToolResult`] rather than as a crash.
//!
//! ## Architecture
//!
//! The protocol side is a stack of Tower services:
//!
//! ```text
//! transport (stdio | HTTP + AuthLayer)
//!   -> McpEndpoint (JSON decoding, notifications, batches)
//!   -> JsonRpcService (JSON-RPC 2.0 framing)
//!   -> McpTracingService (structured logging)
//!   -> McpRouter (initialize, tools/list, tools/call, ping)
//!   -> Dispatcher (validation, then WeatherProvider)
//! ```
//!
//! [`WeatherProvider`] is the seam to the outside world; [`OpenMeteo`] is the
//! production implementation and tests substitute an in-memory fake.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use weather_mcp::config::ProviderConfig;
//! use weather_mcp::{Dispatcher, McpRouter, OpenMeteo, StdioTransport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = OpenMeteo::new(ProviderConfig::default())?;
//!     let router = McpRouter::new(Dispatcher::new(provider));
//!     StdioTransport::new(router).run().await?;
//!     Ok(())
//! }
//! ```
//!
//! Calling a tool directly, without any transport:
//!
//! ```rust,no_run
//! use serde_json::json;
//! use weather_mcp::config::ProviderConfig;
//! use weather_mcp::{Dispatcher, OpenMeteo, ToolCall};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dispatcher = Dispatcher::new(OpenMeteo::new(ProviderConfig::default())?);
//! let result = dispatcher
//!     .dispatch(ToolCall::new("get_forecast", json!({"city": "Oslo", "days": 3})))
//!     .await;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `http` (default) - the networked binding ([`HttpTransport`]) via axum

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod jsonrpc;
pub mod model;
pub mod normalize;
pub mod protocol;
pub mod provider;
pub mod router;
pub mod tool;
pub mod tracing_layer;
pub mod transport;

// Re-exports
pub use auth::{AuthInfo, AuthLayer, StaticBearerValidator};
pub use config::{AuthMode, BearerToken, HttpConfig, ProviderConfig};
pub use dispatch::Dispatcher;
pub use error::{BoxError, Error, Result, ToolError, ToolErrorKind};
pub use jsonrpc::{JsonRpcLayer, JsonRpcService};
pub use model::{CityQuery, CurrentReport, ForecastReport, ToolPayload, ToolResult, ToolStatus};
pub use protocol::{
    CallToolResult, JsonRpcMessage, JsonRpcRequest, JsonRpcResponse, JsonRpcResponseMessage,
    McpRequest, McpResponse,
};
pub use provider::{OpenMeteo, WeatherProvider};
pub use router::{Extensions, McpRouter, RouterRequest, RouterResponse};
pub use tool::{ToolCall, WeatherTool};
pub use tracing_layer::{McpTracingLayer, McpTracingService};
pub use transport::{McpEndpoint, StdioTransport};

#[cfg(feature = "http")]
pub use transport::HttpTransport;
