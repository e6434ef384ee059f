//! Domain types shared by the resolver, forecast client, normalizer and
//! dispatcher.
//!
//! Every value here lives for exactly one tool call. Nothing is cached.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;

/// Smallest forecast window accepted
pub const MIN_FORECAST_DAYS: u8 = 1;

/// Largest forecast window accepted (the provider's own maximum)
pub const MAX_FORECAST_DAYS: u8 = 16;

/// A validated lookup request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityQuery {
    /// Trimmed, non-empty place name
    pub city: String,
    /// Number of days, always within `1..=16`
    pub days: u8,
}

impl CityQuery {
    /// Query for current conditions (one day).
    pub fn current(city: &str) -> Result<Self, ToolError> {
        Self::new(city, i64::from(MIN_FORECAST_DAYS))
    }

    /// Query for a forecast of `days` days.
    ///
    /// Out-of-range values are rejected, never clamped.
    pub fn new(city: &str, days: i64) -> Result<Self, ToolError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(ToolError::validation("'city' must not be empty"));
        }
        let range = i64::from(MIN_FORECAST_DAYS)..=i64::from(MAX_FORECAST_DAYS);
        if !range.contains(&days) {
            return Err(ToolError::validation(format!(
                "'days' must be between {} and {} (got {})",
                MIN_FORECAST_DAYS, MAX_FORECAST_DAYS, days
            )));
        }
        Ok(Self {
            city: city.to_string(),
            days: days as u8,
        })
    }
}

/// Best geocoding match for a place name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    /// Display name as resolved by the provider
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// First-level administrative region (state, province, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Human-readable weather category.
///
/// A closed set: every provider code maps to exactly one label, with
/// [`Condition::Unknown`] for codes outside the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Clear,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Storm,
    Unknown,
}

impl Condition {
    pub const ALL: [Condition; 8] = [
        Condition::Clear,
        Condition::Cloudy,
        Condition::Fog,
        Condition::Drizzle,
        Condition::Rain,
        Condition::Snow,
        Condition::Storm,
        Condition::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Condition::Clear => "clear",
            Condition::Cloudy => "cloudy",
            Condition::Fog => "fog",
            Condition::Drizzle => "drizzle",
            Condition::Rain => "rain",
            Condition::Snow => "snow",
            Condition::Storm => "storm",
            Condition::Unknown => "unknown",
        }
    }
}

/// Current conditions at one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    /// Observation time in the location's local time (`YYYY-MM-DDTHH:MM`)
    pub time: String,
    pub temperature_c: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apparent_temperature_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_humidity: Option<f64>,
    pub wind_speed_kmh: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation_mm: Option<f64>,
    pub weather_code: i64,
    pub condition: Condition,
    pub description: String,
}

/// One day of a forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecastEntry {
    pub date: NaiveDate,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precipitation_sum_mm: Option<f64>,
    pub wind_speed_max_kmh: f64,
    pub weather_code: i64,
    pub condition: Condition,
    pub description: String,
}

/// Payload of `get_weather`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentReport {
    pub city: String,
    pub coordinates: GeoLocation,
    pub current: WeatherObservation,
}

/// Payload of `get_forecast`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub city: String,
    pub coordinates: GeoLocation,
    pub days: u8,
    pub daily: Vec<DailyForecastEntry>,
}

/// Successful tool payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolPayload {
    Current(CurrentReport),
    Forecast(ForecastReport),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Error,
}

/// Outcome of one tool call: either a full payload or a typed error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub status: ToolStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<ToolPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
}

impl ToolResult {
    pub fn success(payload: ToolPayload) -> Self {
        Self {
            status: ToolStatus::Success,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn failure(error: ToolError) -> Self {
        Self {
            status: ToolStatus::Error,
            payload: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Success
    }
}

impl From<Result<ToolPayload, ToolError>> for ToolResult {
    fn from(result: Result<ToolPayload, ToolError>) -> Self {
        match result {
            Ok(payload) => ToolResult::success(payload),
            Err(error) => ToolResult::failure(error),
        }
    }
}
