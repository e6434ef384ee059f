//! Tool dispatcher
//!
//! `dispatch(ToolCall) -> ToolResult` is the single seam shared by every
//! binding. A call goes through two stages:
//!
//! 1. Lookup and argument validation. Failures here never touch the network.
//! 2. Resolver, forecast client and normalizer, in sequence. The first error
//!    is returned unchanged.
//!
//! Every outcome, success or failure, comes back as a [`ToolResult`].

use std::sync::Arc;
use std::time::Instant;

use crate::error::ToolError;
use crate::model::{CityQuery, CurrentReport, ForecastReport, ToolPayload, ToolResult};
use crate::provider::WeatherProvider;
use crate::tool::{ToolCall, WeatherTool};

/// Routes tool calls to the provider pipeline. Stateless; cheap to clone.
#[derive(Clone)]
pub struct Dispatcher {
    provider: Arc<dyn WeatherProvider>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(provider: impl WeatherProvider + 'static) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    pub fn from_shared(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    /// Run one tool call to completion.
    pub async fn dispatch(&self, call: ToolCall) -> ToolResult {
        let start = Instant::now();

        let result = match validate(&call) {
            Ok((tool, query)) => self.execute(tool, &query).await,
            Err(err) => Err(err),
        };

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        match &result {
            Ok(_) => tracing::info!(tool = %call.name, duration_ms, "Tool call succeeded"),
            Err(err) => tracing::warn!(
                tool = %call.name,
                kind = %err.kind,
                error = %err.message,
                duration_ms,
                "Tool call failed"
            ),
        }

        ToolResult::from(result)
    }

    async fn execute(&self, tool: WeatherTool, query: &CityQuery) -> Result<ToolPayload, ToolError> {
        let coordinates = self.provider.resolve(&query.city).await?;

        match tool {
            WeatherTool::GetWeather => {
                let current = self.provider.fetch_current(&coordinates).await?;
                Ok(ToolPayload::Current(CurrentReport {
                    city: coordinates.name.clone(),
                    coordinates,
                    current,
                }))
            }
            WeatherTool::GetForecast => {
                let daily = self.provider.fetch_daily(&coordinates, query.days).await?;
                Ok(ToolPayload::Forecast(ForecastReport {
                    city: coordinates.name.clone(),
                    coordinates,
                    days: query.days,
                    daily,
                }))
            }
        }
    }
}

/// Stage one: tool lookup, then argument validation.
fn validate(call: &ToolCall) -> Result<(WeatherTool, CityQuery), ToolError> {
    let tool = WeatherTool::from_name(&call.name).ok_or_else(|| ToolError::unknown_tool(&call.name))?;
    let query = tool.parse_arguments(&call.arguments)?;
    Ok((tool, query))
}
