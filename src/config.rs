//! Process-wide configuration.
//!
//! Built once at startup from CLI flags / environment variables and shared
//! read-only (behind `Arc`) with the provider and the HTTP binding.

use std::fmt::{self, Debug, Display, Formatter};
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;

// =============================================================================
// Provider
// =============================================================================

/// Outbound provider settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    /// Geocoding search endpoint
    pub geocoding_url: String,
    /// Forecast endpoint
    pub forecast_url: String,
    /// Per-request timeout applied to every outbound call
    pub timeout: Duration,
    /// Locale passed to the geocoder
    pub language: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl ProviderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn geocoding_url(mut self, url: impl Into<String>) -> Self {
        self.geocoding_url = url.into();
        self
    }

    pub fn forecast_url(mut self, url: impl Into<String>) -> Self {
        self.forecast_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Reject settings that would make every call fail.
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("geocoding URL", &self.geocoding_url),
            ("forecast URL", &self.forecast_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "{} must be an http(s) URL, got '{}'",
                    name, url
                )));
            }
        }
        if self.timeout.is_zero() {
            return Err(Error::Config("provider timeout must be non-zero".into()));
        }
        Ok(())
    }
}

// =============================================================================
// Bearer secret
// =============================================================================

/// The configured bearer secret. Debug and Display never reveal it.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Normalize a raw configured value.
    ///
    /// Surrounding whitespace and one layer of matching quotes are stripped,
    /// as values pasted into `.env` files often carry them. Returns `None`
    /// when nothing is left.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut token = raw.trim();
        for quote in ['"', '\''] {
            if let Some(inner) = token
                .strip_prefix(quote)
                .and_then(|t| t.strip_suffix(quote))
            {
                token = inner.trim();
                break;
            }
        }
        if token.is_empty() {
            None
        } else {
            Some(Self(token.to_string()))
        }
    }

    /// The secret value, for comparison only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for BearerToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("[MCP_AUTH_TOKEN]")
    }
}

impl Display for BearerToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("[MCP_AUTH_TOKEN]")
    }
}

// =============================================================================
// HTTP binding
// =============================================================================

/// How the networked binding authenticates tool calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// Every POST must carry `Authorization: Bearer <token>`
    Bearer(BearerToken),
    /// No token configured and the operator explicitly allowed it
    Open,
}

impl AuthMode {
    /// Resolve the auth mode from the configured token.
    ///
    /// An empty token is a startup error unless `allow_unauthenticated` is set.
    pub fn from_config(token: Option<&str>, allow_unauthenticated: bool) -> Result<Self> {
        match token.and_then(BearerToken::parse) {
            Some(token) => Ok(AuthMode::Bearer(token)),
            None if allow_unauthenticated => Ok(AuthMode::Open),
            None => Err(Error::Config(
                "MCP_AUTH_TOKEN is empty; set a token or pass --allow-unauthenticated".into(),
            )),
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, AuthMode::Bearer(_))
    }
}

/// Networked binding settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    pub auth: AuthMode,
}

impl HttpConfig {
    pub fn new(auth: AuthMode) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            auth,
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Socket address to bind. `host` may be an IPv4 or bare IPv6 literal
    /// or a host name; the first resolved address wins.
    pub async fn resolve_addr(&self) -> Result<SocketAddr> {
        let invalid = |reason: String| {
            Error::Config(format!("invalid bind address {}:{}: {}", self.host, self.port, reason))
        };
        tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .map_err(|e| invalid(e.to_string()))?
            .next()
            .ok_or_else(|| invalid("host resolved to no addresses".to_string()))
    }
}
