//! weather-mcp command line
//!
//! `serve` runs the networked binding, `stdio` the pipe binding. `weather` and
//! `forecast` run a single tool call and print the result.

use std::process::ExitCode;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;
use weather_mcp::config::{
    DEFAULT_FORECAST_URL, DEFAULT_GEOCODING_URL, DEFAULT_HOST, DEFAULT_LANGUAGE, DEFAULT_PORT,
};
use weather_mcp::{
    AuthMode, BoxError, Dispatcher, HttpConfig, HttpTransport, McpRouter, OpenMeteo, ProviderConfig,
    StdioTransport, ToolCall,
};

#[derive(Parser, Debug)]
#[command(name = "weather-mcp", version)]
#[command(about = "MCP server for current weather and forecasts from Open-Meteo", long_about = None)]
struct Cli {
    #[command(flatten)]
    provider: ProviderArgs,

    /// Log level
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ProviderArgs {
    /// Geocoding search endpoint
    #[arg(long, global = true, env = "WEATHER_GEOCODING_URL", default_value = DEFAULT_GEOCODING_URL)]
    geocoding_url: String,

    /// Forecast endpoint
    #[arg(long, global = true, env = "WEATHER_FORECAST_URL", default_value = DEFAULT_FORECAST_URL)]
    forecast_url: String,

    /// Timeout for each provider request, in seconds
    #[arg(long, global = true, env = "WEATHER_TIMEOUT_SECS", default_value = "5")]
    timeout_secs: u64,

    /// Locale passed to the geocoder
    #[arg(long, global = true, env = "WEATHER_LANGUAGE", default_value = DEFAULT_LANGUAGE)]
    language: String,
}

impl ProviderArgs {
    fn config(&self) -> ProviderConfig {
        ProviderConfig::new()
            .geocoding_url(&self.geocoding_url)
            .forecast_url(&self.forecast_url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .language(&self.language)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve MCP over HTTP at /mcp with bearer-token auth
    Serve {
        /// Bearer token required on every POST
        #[arg(long, env = "MCP_AUTH_TOKEN", hide_env_values = true)]
        auth_token: Option<String>,

        /// Serve without authentication when no token is set
        #[arg(
            long,
            env = "MCP_ALLOW_UNAUTHENTICATED",
            action = ArgAction::SetTrue,
            value_parser = BoolishValueParser::new()
        )]
        allow_unauthenticated: bool,

        /// Address to bind
        #[arg(long, env = "MCP_HOST", default_value = DEFAULT_HOST)]
        host: String,

        /// Port to bind
        #[arg(long, env = "MCP_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
    },

    /// Serve MCP over stdin/stdout
    Stdio,

    /// Print current conditions for a city
    Weather {
        #[arg(long)]
        city: String,
    },

    /// Print a daily forecast for a city
    Forecast {
        #[arg(long)]
        city: String,

        /// Number of days (1-16)
        #[arg(long, default_value = "3")]
        days: i64,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, BoxError> {
    let cli = Cli::parse();

    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&cli.log_level, rust_log.as_deref())?)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.provider.config();
    let provider = OpenMeteo::new(config)?;
    let dispatcher = Dispatcher::new(provider);

    match cli.command {
        Command::Serve {
            auth_token,
            allow_unauthenticated,
            host,
            port,
        } => {
            let auth = AuthMode::from_config(auth_token.as_deref(), allow_unauthenticated)?;
            let http = HttpConfig::new(auth).host(host).port(port);
            let addr = http.resolve_addr().await?;

            tracing::info!(%addr, auth_required = http.auth.is_required(), "Starting weather-mcp server");
            HttpTransport::new(McpRouter::new(dispatcher), http.auth)
                .serve(addr)
                .await?;
        }
        Command::Stdio => {
            tracing::info!("Serving over stdio");
            StdioTransport::new(McpRouter::new(dispatcher)).run().await?;
        }
        Command::Weather { city } => {
            let call = ToolCall::new("get_weather", json!({ "city": city }));
            return print_result(&dispatcher, call).await;
        }
        Command::Forecast { city, days } => {
            let call = ToolCall::new("get_forecast", json!({ "city": city, "days": days }));
            return print_result(&dispatcher, call).await;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// `RUST_LOG`, when set, wins over `--log-level`.
fn log_filter(log_level: &str, rust_log: Option<&str>) -> Result<EnvFilter, ParseError> {
    match rust_log.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives),
        None => EnvFilter::try_new(format!("weather_mcp={}", log_level)),
    }
}

async fn print_result(
    dispatcher: &Dispatcher,
    call: ToolCall,
) -> Result<ExitCode, BoxError> {
    let result = dispatcher.dispatch(call).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
