//! Tool registry
//!
//! The catalog is fixed: [`WeatherTool::GetWeather`] and
//! [`WeatherTool::GetForecast`]. Each tool has a typed argument struct whose
//! JSON schema is generated with `schemars`, and a parser that turns raw
//! call arguments into a validated [`CityQuery`].

use schemars::JsonSchema;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ToolError;
use crate::model::CityQuery;
use crate::protocol::{CallToolParams, ToolAnnotations, ToolDefinition};

/// A tool invocation as received from any binding.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Tool name, matched exactly against the catalog
    pub name: String,
    /// Raw JSON arguments; `null` is treated as `{}`
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

impl From<CallToolParams> for ToolCall {
    fn from(params: CallToolParams) -> Self {
        Self::new(params.name, params.arguments)
    }
}

/// Arguments of `get_weather`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetWeatherInput {
    /// City or place name, e.g. "Paris" or "San Francisco"
    pub city: String,
}

/// Arguments of `get_forecast`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetForecastInput {
    /// City or place name, e.g. "Paris" or "San Francisco"
    pub city: String,
    /// Number of days to forecast, starting today
    #[schemars(range(min = 1, max = 16))]
    pub days: i64,
}

/// The registered tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherTool {
    GetWeather,
    GetForecast,
}

impl WeatherTool {
    pub const ALL: [WeatherTool; 2] = [WeatherTool::GetWeather, WeatherTool::GetForecast];

    pub fn name(self) -> &'static str {
        match self {
            WeatherTool::GetWeather => "get_weather",
            WeatherTool::GetForecast => "get_forecast",
        }
    }

    /// Exact, case-sensitive lookup
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn title(self) -> &'static str {
        match self {
            WeatherTool::GetWeather => "Current weather",
            WeatherTool::GetForecast => "Daily forecast",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            WeatherTool::GetWeather => {
                "Get the current weather for a city: temperature, feels-like temperature, \
                 humidity, wind speed, precipitation and a condition label."
            }
            WeatherTool::GetForecast => {
                "Get a daily weather forecast for a city for 1 to 16 days, starting today: \
                 min/max temperature, precipitation, max wind speed and a condition label per day."
            }
        }
    }

    pub fn input_schema(self) -> Value {
        match self {
            WeatherTool::GetWeather => schema_of::<GetWeatherInput>(),
            WeatherTool::GetForecast => schema_of::<GetForecastInput>(),
        }
    }

    /// Definition advertised by `tools/list`
    pub fn definition(self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: Some(self.description().to_string()),
            input_schema: self.input_schema(),
            annotations: Some(ToolAnnotations {
                title: Some(self.title().to_string()),
                read_only_hint: true,
                idempotent_hint: true,
                open_world_hint: true,
            }),
        }
    }

    /// Validate raw arguments into a query. Never touches the network.
    pub fn parse_arguments(self, arguments: &Value) -> Result<CityQuery, ToolError> {
        match self {
            WeatherTool::GetWeather => {
                let input: GetWeatherInput = deserialize_args(self, arguments)?;
                CityQuery::current(&input.city)
            }
            WeatherTool::GetForecast => {
                let input: GetForecastInput = deserialize_args(self, arguments)?;
                CityQuery::new(&input.city, input.days)
            }
        }
    }
}

/// Definitions for every registered tool, in catalog order
pub fn catalog() -> Vec<ToolDefinition> {
    WeatherTool::ALL.into_iter().map(WeatherTool::definition).collect()
}

/// Names of every registered tool, in catalog order
pub fn tool_names() -> Vec<&'static str> {
    WeatherTool::ALL.into_iter().map(WeatherTool::name).collect()
}

fn schema_of<I: JsonSchema>() -> Value {
    let schema = schemars::schema_for!(I);
    serde_json::to_value(schema).unwrap_or_else(|_| serde_json::json!({ "type": "object" }))
}

fn deserialize_args<I: DeserializeOwned>(tool: WeatherTool, arguments: &Value) -> Result<I, ToolError> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        Value::Object(_) => arguments.clone(),
        other => {
            return Err(ToolError::validation(format!(
                "Arguments for {} must be an object, got {}",
                tool.name(),
                json_type(other)
            )));
        }
    };
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::validation(format!("Invalid arguments for {}: {}", tool.name(), e)))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolErrorKind;
    use serde_json::json;

    #[test]
    fn test_lookup_is_exact() {
        assert_eq!(WeatherTool::from_name("get_weather"), Some(WeatherTool::GetWeather));
        assert_eq!(WeatherTool::from_name("get_forecast"), Some(WeatherTool::GetForecast));
        assert_eq!(WeatherTool::from_name("Get_Weather"), None);
        assert_eq!(WeatherTool::from_name("weather"), None);
    }

    #[test]
    fn test_catalog_definitions() {
        let tools = catalog();
        assert_eq!(tools.len(), 2);
        assert_eq!(tool_names(), vec!["get_weather", "get_forecast"]);

        for tool in &tools {
            let annotations = tool.annotations.as_ref().unwrap();
            assert!(annotations.read_only_hint);
            assert!(annotations.idempotent_hint);
            assert!(tool.description.is_some());
        }
    }

    #[test]
    fn test_forecast_schema() {
        let schema = WeatherTool::GetForecast.input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["city"]["type"], "string");
        assert_eq!(schema["properties"]["days"]["minimum"].as_f64(), Some(1.0));
        assert_eq!(schema["properties"]["days"]["maximum"].as_f64(), Some(16.0));

        let required = schema["required"].as_array().unwrap();
        assert!(required.contains(&json!("city")));
        assert!(required.contains(&json!("days")));
    }

    #[test]
    fn test_weather_schema_requires_city() {
        let schema = WeatherTool::GetWeather.input_schema();
        assert_eq!(schema["required"], json!(["city"]));
        assert!(schema["properties"].get("days").is_none());
    }

    #[test]
    fn test_parse_weather_args() {
        let query = WeatherTool::GetWeather
            .parse_arguments(&json!({"city": " Lyon "}))
            .unwrap();
        assert_eq!(query.city, "Lyon");
        assert_eq!(query.days, 1);
    }

    #[test]
    fn test_parse_forecast_args() {
        let query = WeatherTool::GetForecast
            .parse_arguments(&json!({"city": "Paris", "days": 5}))
            .unwrap();
        assert_eq!(query.days, 5);
    }

    #[test]
    fn test_validation_failures() {
        let cases = [
            (WeatherTool::GetWeather, json!({})),
            (WeatherTool::GetWeather, Value::Null),
            (WeatherTool::GetWeather, json!({"city": 42})),
            (WeatherTool::GetWeather, json!({"city": ""})),
            (WeatherTool::GetWeather, json!(["Paris"])),
            (WeatherTool::GetForecast, json!({"city": "Paris"})),
            (WeatherTool::GetForecast, json!({"city": "Paris", "days": "3"})),
            (WeatherTool::GetForecast, json!({"city": "Paris", "days": 20})),
            (WeatherTool::GetForecast, json!({"city": "Paris", "days": 0})),
            (WeatherTool::GetForecast, json!({"city": "Paris", "days": 2.5})),
        ];
        for (tool, args) in cases {
            let err = tool.parse_arguments(&args).unwrap_err();
            assert_eq!(err.kind, ToolErrorKind::Validation, "{:?} {}", tool, args);
        }
    }
}
