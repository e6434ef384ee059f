//! Response normalizer
//!
//! Pure mapping from raw Open-Meteo JSON into the stable output schema in
//! [`crate::model`]. Numeric WMO weather codes become a [`Condition`] label and
//! an English description via a static table. A code outside the table maps
//! to [`Condition::Unknown`]; only missing or mistyped required fields fail,
//! with [`ToolErrorKind::MalformedResponse`](crate::error::ToolErrorKind).

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ToolError;
use crate::model::{Condition, DailyForecastEntry, WeatherObservation};

/// Fields requested from the forecast endpoint for current conditions.
pub const CURRENT_FIELDS: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "apparent_temperature",
    "weather_code",
    "wind_speed_10m",
    "precipitation",
];

/// Fields requested from the forecast endpoint for daily forecasts.
pub const DAILY_FIELDS: &[&str] = &[
    "weather_code",
    "temperature_2m_max",
    "temperature_2m_min",
    "precipitation_sum",
    "wind_speed_10m_max",
];

/// WMO weather interpretation codes as documented by Open-Meteo.
const WEATHER_CODES: &[(i64, Condition, &str)] = &[
    (0, Condition::Clear, "Clear sky"),
    (1, Condition::Clear, "Mainly clear"),
    (2, Condition::Cloudy, "Partly cloudy"),
    (3, Condition::Cloudy, "Overcast"),
    (45, Condition::Fog, "Fog"),
    (48, Condition::Fog, "Depositing rime fog"),
    (51, Condition::Drizzle, "Light drizzle"),
    (53, Condition::Drizzle, "Moderate drizzle"),
    (55, Condition::Drizzle, "Dense drizzle"),
    (56, Condition::Drizzle, "Light freezing drizzle"),
    (57, Condition::Drizzle, "Dense freezing drizzle"),
    (61, Condition::Rain, "Slight rain"),
    (63, Condition::Rain, "Moderate rain"),
    (65, Condition::Rain, "Heavy rain"),
    (66, Condition::Rain, "Light freezing rain"),
    (67, Condition::Rain, "Heavy freezing rain"),
    (71, Condition::Snow, "Slight snowfall"),
    (73, Condition::Snow, "Moderate snowfall"),
    (75, Condition::Snow, "Heavy snowfall"),
    (77, Condition::Snow, "Snow grains"),
    (80, Condition::Rain, "Slight rain showers"),
    (81, Condition::Rain, "Moderate rain showers"),
    (82, Condition::Rain, "Violent rain showers"),
    (85, Condition::Snow, "Slight snow showers"),
    (86, Condition::Snow, "Heavy snow showers"),
    (95, Condition::Storm, "Thunderstorm"),
    (96, Condition::Storm, "Thunderstorm with slight hail"),
    (99, Condition::Storm, "Thunderstorm with heavy hail"),
];

fn lookup(code: i64) -> Option<(Condition, &'static str)> {
    WEATHER_CODES
        .iter()
        .find(|(c, _, _)| *c == code)
        .map(|(_, condition, text)| (*condition, *text))
}

/// Condition label for a weather code. Never fails.
pub fn condition_for(code: i64) -> Condition {
    lookup(code).map_or(Condition::Unknown, |(condition, _)| condition)
}

/// Human-readable description for a weather code. Never fails.
pub fn describe(code: i64) -> String {
    match lookup(code) {
        Some((_, text)) => text.to_string(),
        None => format!("Weather code {}", code),
    }
}

// =============================================================================
// Current conditions
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawCurrentResponse {
    current: Option<RawCurrent>,
}

#[derive(Debug, Deserialize)]
struct RawCurrent {
    time: Option<String>,
    temperature_2m: Option<f64>,
    relative_humidity_2m: Option<f64>,
    apparent_temperature: Option<f64>,
    weather_code: Option<i64>,
    wind_speed_10m: Option<f64>,
    precipitation: Option<f64>,
}

/// Normalize a forecast-endpoint response requested with `current=...`.
pub fn normalize_current(raw: &Value) -> Result<WeatherObservation, ToolError> {
    let response = RawCurrentResponse::deserialize(raw)
        .map_err(|e| ToolError::malformed(format!("Unexpected current weather shape: {}", e)))?;
    let current = response
        .current
        .ok_or_else(|| missing("current"))?;

    let time = current.time.ok_or_else(|| missing("current.time"))?;
    NaiveDateTime::parse_from_str(&time, "%Y-%m-%dT%H:%M")
        .map_err(|_| ToolError::malformed(format!("Invalid observation time '{}'", time)))?;
    let temperature_c = current
        .temperature_2m
        .ok_or_else(|| missing("current.temperature_2m"))?;
    let wind_speed_kmh = current
        .wind_speed_10m
        .ok_or_else(|| missing("current.wind_speed_10m"))?;
    let weather_code = current
        .weather_code
        .ok_or_else(|| missing("current.weather_code"))?;

    Ok(WeatherObservation {
        time,
        temperature_c,
        apparent_temperature_c: current.apparent_temperature,
        relative_humidity: current.relative_humidity_2m,
        wind_speed_kmh,
        precipitation_mm: current.precipitation,
        weather_code,
        condition: condition_for(weather_code),
        description: describe(weather_code),
    })
}

// =============================================================================
// Daily forecast
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawDailyResponse {
    daily: Option<RawDaily>,
}

#[derive(Debug, Deserialize)]
struct RawDaily {
    time: Option<Vec<String>>,
    weather_code: Option<Vec<Option<i64>>>,
    temperature_2m_max: Option<Vec<Option<f64>>>,
    temperature_2m_min: Option<Vec<Option<f64>>>,
    precipitation_sum: Option<Vec<Option<f64>>>,
    wind_speed_10m_max: Option<Vec<Option<f64>>>,
}

/// Normalize a forecast-endpoint response requested with `daily=...`.
///
/// The provider must return exactly `days` entries in strictly ascending
/// date order; anything else is reported as malformed rather than trimmed.
pub fn normalize_daily(raw: &Value, days: u8) -> Result<Vec<DailyForecastEntry>, ToolError> {
    let response = RawDailyResponse::deserialize(raw)
        .map_err(|e| ToolError::malformed(format!("Unexpected daily forecast shape: {}", e)))?;
    let daily = response.daily.ok_or_else(|| missing("daily"))?;

    let dates = daily.time.ok_or_else(|| missing("daily.time"))?;
    let expected = usize::from(days);
    if dates.len() != expected {
        return Err(ToolError::malformed(format!(
            "Expected {} forecast days, provider returned {}",
            expected,
            dates.len()
        )));
    }

    let codes = column(daily.weather_code, "daily.weather_code", expected)?;
    let max = column(daily.temperature_2m_max, "daily.temperature_2m_max", expected)?;
    let min = column(daily.temperature_2m_min, "daily.temperature_2m_min", expected)?;
    let wind = column(daily.wind_speed_10m_max, "daily.wind_speed_10m_max", expected)?;
    let precipitation = daily.precipitation_sum.unwrap_or_default();

    let mut entries: Vec<DailyForecastEntry> = Vec::with_capacity(expected);
    for (i, raw_date) in dates.iter().enumerate() {
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .map_err(|_| ToolError::malformed(format!("Invalid forecast date '{}'", raw_date)))?;
        if let Some(previous) = entries.last()
            && previous.date >= date
        {
            return Err(ToolError::malformed(format!(
                "Forecast dates out of order: {} follows {}",
                date, previous.date
            )));
        }

        let weather_code = required(&codes, i, "daily.weather_code")?;
        entries.push(DailyForecastEntry {
            date,
            temp_min_c: required(&min, i, "daily.temperature_2m_min")?,
            temp_max_c: required(&max, i, "daily.temperature_2m_max")?,
            precipitation_sum_mm: precipitation.get(i).copied().flatten(),
            wind_speed_max_kmh: required(&wind, i, "daily.wind_speed_10m_max")?,
            weather_code,
            condition: condition_for(weather_code),
            description: describe(weather_code),
        });
    }

    Ok(entries)
}

fn column<T>(values: Option<Vec<Option<T>>>, field: &str, len: usize) -> Result<Vec<Option<T>>, ToolError> {
    let values = values.ok_or_else(|| missing(field))?;
    if values.len() != len {
        return Err(ToolError::malformed(format!(
            "Field '{}' has {} values, expected {}",
            field,
            values.len(),
            len
        )));
    }
    Ok(values)
}

fn required<T: Copy>(values: &[Option<T>], index: usize, field: &str) -> Result<T, ToolError> {
    values
        .get(index)
        .copied()
        .flatten()
        .ok_or_else(|| ToolError::malformed(format!("Missing '{}' for day {}", field, index + 1)))
}

fn missing(field: &str) -> ToolError {
    ToolError::malformed(format!("Provider response is missing '{}'", field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolErrorKind;
    use serde_json::json;

    fn current_payload(code: Value) -> Value {
        json!({
            "latitude": 48.86,
            "longitude": 2.35,
            "current": {
                "time": "2026-10-18T14:00",
                "interval": 900,
                "temperature_2m": 14.2,
                "relative_humidity_2m": 71,
                "apparent_temperature": 12.9,
                "weather_code": code,
                "wind_speed_10m": 11.5,
                "precipitation": 0.0
            }
        })
    }

    fn daily_payload(dates: &[&str]) -> Value {
        let n = dates.len();
        json!({
            "daily": {
                "time": dates,
                "weather_code": vec![61; n],
                "temperature_2m_max": vec![18.0; n],
                "temperature_2m_min": vec![9.5; n],
                "precipitation_sum": vec![1.2; n],
                "wind_speed_10m_max": vec![22.3; n]
            }
        })
    }

    #[test]
    fn test_overcast_is_cloudy() {
        assert_eq!(condition_for(3), Condition::Cloudy);
        assert_eq!(describe(3), "Overcast");
    }

    #[test]
    fn test_code_families() {
        assert_eq!(condition_for(0), Condition::Clear);
        assert_eq!(condition_for(48), Condition::Fog);
        assert_eq!(condition_for(55), Condition::Drizzle);
        assert_eq!(condition_for(82), Condition::Rain);
        assert_eq!(condition_for(86), Condition::Snow);
        assert_eq!(condition_for(99), Condition::Storm);
    }

    #[test]
    fn test_unknown_code_does_not_fail() {
        assert_eq!(condition_for(42), Condition::Unknown);
        assert_eq!(condition_for(-1), Condition::Unknown);
        assert_eq!(describe(42), "Weather code 42");

        let observation = normalize_current(&current_payload(json!(42))).unwrap();
        assert_eq!(observation.condition, Condition::Unknown);
    }

    #[test]
    fn test_every_table_code_has_a_label() {
        for (code, condition, text) in WEATHER_CODES {
            assert_ne!(*condition, Condition::Unknown, "code {code}");
            assert_eq!(describe(*code), *text);
        }
    }

    #[test]
    fn test_normalize_current() {
        let observation = normalize_current(&current_payload(json!(3))).unwrap();
        assert_eq!(observation.time, "2026-10-18T14:00");
        assert_eq!(observation.temperature_c, 14.2);
        assert_eq!(observation.wind_speed_kmh, 11.5);
        assert_eq!(observation.relative_humidity, Some(71.0));
        assert_eq!(observation.condition, Condition::Cloudy);
        assert_eq!(observation.description, "Overcast");
    }

    #[test]
    fn test_current_missing_required_field() {
        for field in ["temperature_2m", "wind_speed_10m", "weather_code", "time"] {
            let mut payload = current_payload(json!(1));
            payload["current"].as_object_mut().unwrap().remove(field);
            let err = normalize_current(&payload).unwrap_err();
            assert_eq!(err.kind, ToolErrorKind::MalformedResponse, "{field}");
            assert!(err.message.contains(field));
        }
    }

    #[test]
    fn test_current_optional_fields_may_be_absent() {
        let payload = json!({
            "current": {
                "time": "2026-10-18T14:00",
                "temperature_2m": -3.0,
                "weather_code": 71,
                "wind_speed_10m": 4.0
            }
        });
        let observation = normalize_current(&payload).unwrap();
        assert_eq!(observation.apparent_temperature_c, None);
        assert_eq!(observation.precipitation_mm, None);
        assert_eq!(observation.condition, Condition::Snow);
    }

    #[test]
    fn test_current_mistyped_field_is_malformed() {
        let mut payload = current_payload(json!(2));
        payload["current"]["temperature_2m"] = json!("warm");
        let err = normalize_current(&payload).unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::MalformedResponse);
    }

    #[test]
    fn test_current_block_absent() {
        let err = normalize_current(&json!({"latitude": 1.0})).unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::MalformedResponse);
    }

    #[test]
    fn test_normalize_daily_ordered() {
        let payload = daily_payload(&["2026-10-18", "2026-10-19", "2026-10-20"]);
        let entries = normalize_daily(&payload, 3).unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(entries[0].date, NaiveDate::from_ymd_opt(2026, 10, 18).unwrap());
        assert_eq!(entries[0].condition, Condition::Rain);
        assert_eq!(entries[0].precipitation_sum_mm, Some(1.2));
    }

    #[test]
    fn test_daily_length_mismatch() {
        let payload = daily_payload(&["2026-10-18", "2026-10-19"]);
        let err = normalize_daily(&payload, 3).unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::MalformedResponse);
    }

    #[test]
    fn test_daily_out_of_order() {
        let payload = daily_payload(&["2026-10-19", "2026-10-18"]);
        let err = normalize_daily(&payload, 2).unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::MalformedResponse);
        assert!(err.message.contains("out of order"));
    }

    #[test]
    fn test_daily_null_required_value() {
        let mut payload = daily_payload(&["2026-10-18", "2026-10-19"]);
        payload["daily"]["temperature_2m_min"] = json!([9.0, null]);
        let err = normalize_daily(&payload, 2).unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::MalformedResponse);
        assert!(err.message.contains("day 2"));
    }

    #[test]
    fn test_daily_null_precipitation_is_allowed() {
        let mut payload = daily_payload(&["2026-10-18"]);
        payload["daily"]["precipitation_sum"] = json!([null]);
        let entries = normalize_daily(&payload, 1).unwrap();
        assert_eq!(entries[0].precipitation_sum_mm, None);
    }

    #[test]
    fn test_normalization_is_deterministic() {
        let payload = daily_payload(&["2026-10-18", "2026-10-19"]);
        let a = serde_json::to_vec(&normalize_daily(&payload, 2).unwrap()).unwrap();
        let b = serde_json::to_vec(&normalize_daily(&payload, 2).unwrap()).unwrap();
        assert_eq!(a, b);

        let payload = current_payload(json!(95));
        let a = serde_json::to_vec(&normalize_current(&payload).unwrap()).unwrap();
        let b = serde_json::to_vec(&normalize_current(&payload).unwrap()).unwrap();
        assert_eq!(a, b);
    }
}
