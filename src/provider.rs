//! Outbound weather provider
//!
//! [`WeatherProvider`] is the seam between the dispatcher and the network:
//! the coordinate resolver ([`resolve`](WeatherProvider::resolve)) and the
//! forecast client ([`fetch_current`](WeatherProvider::fetch_current),
//! [`fetch_daily`](WeatherProvider::fetch_daily)). [`OpenMeteo`] is the
//! production implementation.
//!
//! Every method makes exactly one HTTP request, bounded by the configured
//! timeout, and never retries. Nothing is cached between calls.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::config::ProviderConfig;
use crate::error::{Error, Result, ToolError};
use crate::model::{DailyForecastEntry, GeoLocation, WeatherObservation};
use crate::normalize::{self, CURRENT_FIELDS, DAILY_FIELDS};

/// A boxed future, as used by the dyn-compatible provider trait
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Geocoding and forecast lookups.
pub trait WeatherProvider: Send + Sync {
    /// Resolve a place name to its single best match.
    fn resolve<'a>(&'a self, city: &'a str) -> BoxFuture<'a, std::result::Result<GeoLocation, ToolError>>;

    /// Current conditions at a location.
    fn fetch_current<'a>(
        &'a self,
        location: &'a GeoLocation,
    ) -> BoxFuture<'a, std::result::Result<WeatherObservation, ToolError>>;

    /// `days` daily entries starting today (local time at the location).
    fn fetch_daily<'a>(
        &'a self,
        location: &'a GeoLocation,
        days: u8,
    ) -> BoxFuture<'a, std::result::Result<Vec<DailyForecastEntry>, ToolError>>;
}

// =============================================================================
// Open-Meteo
// =============================================================================

/// Open-Meteo geocoding + forecast client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct OpenMeteo {
    client: reqwest::Client,
    config: Arc<ProviderConfig>,
}

impl std::fmt::Debug for OpenMeteo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenMeteo")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Option<Vec<Place>>,
}

#[derive(Debug, Deserialize)]
struct Place {
    name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    country_code: Option<String>,
    country: Option<String>,
    admin1: Option<String>,
    timezone: Option<String>,
}

impl OpenMeteo {
    /// Create a client. The configured timeout applies to each request as a whole.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("weather-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// One GET returning a JSON body. Transport failures, non-2xx statuses and
    /// non-JSON bodies are all upstream errors.
    async fn get_json(
        &self,
        endpoint: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> std::result::Result<Value, ToolError> {
        tracing::debug!(endpoint, url, "Calling provider");

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    "timed out".to_string()
                } else if e.is_connect() {
                    "is unreachable".to_string()
                } else {
                    format!("request failed: {}", e)
                };
                tracing::warn!(endpoint, error = %e, "Provider request failed");
                ToolError::upstream(format!("Weather provider {} {}", endpoint, reason))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(endpoint, status = status.as_u16(), "Provider returned error status");
            return Err(ToolError::upstream(format!(
                "Weather provider {} returned HTTP {}",
                endpoint, status
            )));
        }

        response.json::<Value>().await.map_err(|e| {
            tracing::warn!(endpoint, error = %e, "Provider returned unreadable body");
            let reason = if e.is_timeout() {
                "timed out".to_string()
            } else {
                "returned a body that is not JSON".to_string()
            };
            ToolError::upstream(format!("Weather provider {} {}", endpoint, reason))
        })
    }

    fn coordinates(location: &GeoLocation) -> [(&'static str, String); 3] {
        [
            ("latitude", location.latitude.to_string()),
            ("longitude", location.longitude.to_string()),
            ("timezone", "auto".to_string()),
        ]
    }

    async fn resolve_city(&self, city: &str) -> std::result::Result<GeoLocation, ToolError> {
        let query = [
            ("name", city.to_string()),
            ("count", "1".to_string()),
            ("language", self.config.language.clone()),
            ("format", "json".to_string()),
        ];
        let body = self
            .get_json("geocoding", &self.config.geocoding_url, &query)
            .await?;

        let response = GeocodingResponse::deserialize(&body).map_err(|e| {
            tracing::warn!(error = %e, "Unexpected geocoding response");
            ToolError::upstream("Weather provider geocoding returned an unexpected response")
        })?;

        let Some(place) = response.results.and_then(|r| r.into_iter().next()) else {
            tracing::debug!(city, "No geocoding match");
            return Err(ToolError::not_found(format!("No location found for '{}'", city)));
        };

        let (Some(latitude), Some(longitude)) = (place.latitude, place.longitude) else {
            return Err(ToolError::upstream(
                "Weather provider geocoding returned a match without coordinates",
            ));
        };

        let location = GeoLocation {
            latitude,
            longitude,
            name: place.name.unwrap_or_else(|| city.to_string()),
            country_code: place.country_code,
            country: place.country,
            admin1: place.admin1,
            timezone: place.timezone,
        };
        tracing::debug!(
            city,
            resolved = %location.name,
            latitude,
            longitude,
            "Resolved city"
        );
        Ok(location)
    }

    async fn current(&self, location: &GeoLocation) -> std::result::Result<WeatherObservation, ToolError> {
        let mut query = Self::coordinates(location).to_vec();
        query.push(("current", CURRENT_FIELDS.join(",")));
        let body = self
            .get_json("forecast", &self.config.forecast_url, &query)
            .await?;
        normalize::normalize_current(&body)
    }

    async fn daily(
        &self,
        location: &GeoLocation,
        days: u8,
    ) -> std::result::Result<Vec<DailyForecastEntry>, ToolError> {
        let mut query = Self::coordinates(location).to_vec();
        query.push(("daily", DAILY_FIELDS.join(",")));
        query.push(("forecast_days", days.to_string()));
        let body = self
            .get_json("forecast", &self.config.forecast_url, &query)
            .await?;
        normalize::normalize_daily(&body, days)
    }
}

impl WeatherProvider for OpenMeteo {
    fn resolve<'a>(&'a self, city: &'a str) -> BoxFuture<'a, std::result::Result<GeoLocation, ToolError>> {
        Box::pin(self.resolve_city(city))
    }

    fn fetch_current<'a>(
        &'a self,
        location: &'a GeoLocation,
    ) -> BoxFuture<'a, std::result::Result<WeatherObservation, ToolError>> {
        Box::pin(self.current(location))
    }

    fn fetch_daily<'a>(
        &'a self,
        location: &'a GeoLocation,
        days: u8,
    ) -> BoxFuture<'a, std::result::Result<Vec<DailyForecastEntry>, ToolError>> {
        Box::pin(self.daily(location, days))
    }
}
