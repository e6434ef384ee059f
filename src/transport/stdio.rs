//! Stdio transport for MCP
//!
//! Reads JSON-RPC messages from stdin and writes responses to stdout, one
//! message per line. No authentication: the process boundary is the trust
//! boundary. Logs go to stderr so stdout carries nothing but protocol frames.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::{Error, JsonRpcError, Result};
use crate::protocol::{JsonRpcResponse, JsonRpcResponseMessage};
use crate::router::{Extensions, McpRouter};
use crate::transport::McpEndpoint;

/// Stdio transport for MCP servers
///
/// # Example
///
/// ```rust,no_run
/// use weather_mcp::config::ProviderConfig;
/// use weather_mcp::{Dispatcher, McpRouter, OpenMeteo, StdioTransport};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let provider = OpenMeteo::new(ProviderConfig::default())?;
///     let router = McpRouter::new(Dispatcher::new(provider));
///
///     StdioTransport::new(router).run().await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct StdioTransport {
    endpoint: McpEndpoint,
}

impl StdioTransport {
    pub fn new(router: McpRouter) -> Self {
        Self {
            endpoint: McpEndpoint::new(router),
        }
    }

    /// Run the transport on the process's stdin/stdout until EOF
    pub async fn run(&self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Process line-delimited messages from `reader` until EOF, writing each
    /// response as one line to `writer`.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();
        tracing::info!("Stdio transport started, waiting for input");

        loop {
            buf.clear();
            let bytes_read = reader
                .read_until(b'\n', &mut buf)
                .await
                .map_err(|e| Error::Transport(format!("Failed to read from stdin: {}", e)))?;

            if bytes_read == 0 {
                tracing::info!("Stdin closed, shutting down");
                break;
            }

            let response = match std::str::from_utf8(&buf) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    tracing::debug!(bytes = trimmed.len(), "Received message");
                    match self.endpoint.handle_text(trimmed, Extensions::new()).await {
                        Some(response) => response,
                        None => continue,
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Received line that is not valid UTF-8");
                    JsonRpcResponseMessage::Single(JsonRpcResponse::error(
                        None,
                        JsonRpcError::parse_error(format!("Invalid UTF-8: {}", e)),
                    ))
                }
            };

            let mut frame = serde_json::to_string(&response)?;
            frame.push('\n');
            writer
                .write_all(frame.as_bytes())
                .await
                .map_err(|e| Error::Transport(format!("Failed to write to stdout: {}", e)))?;
            writer
                .flush()
                .await
                .map_err(|e| Error::Transport(format!("Failed to flush stdout: {}", e)))?;
        }

        Ok(())
    }
}
