//! Integration tests for weather-mcp
//!
//! Drive the full JSON-RPC flow (transport -> router -> dispatcher ->
//! Open-Meteo client -> normalizer) against a mocked provider.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{Value, json};
use tower::ServiceExt;
use weather_mcp::normalize::{CURRENT_FIELDS, DAILY_FIELDS};
use weather_mcp::{
    AuthMode, BearerToken, Dispatcher, Extensions, HttpTransport, JsonRpcRequest, JsonRpcService,
    McpEndpoint, McpRouter, OpenMeteo, ProviderConfig, StdioTransport,
};

// =============================================================================
// Test fixtures
// =============================================================================

const PARIS: &str = r#"{"results": [{"name": "Paris", "latitude": 48.85341, "longitude": 2.3488,
    "country_code": "FR", "country": "France", "timezone": "Europe/Paris"}]}"#;

const PARIS_CURRENT: &str = r#"{"current": {"time": "2026-10-18T14:00", "temperature_2m": 14.2,
    "relative_humidity_2m": 71, "apparent_temperature": 12.9, "weather_code": 3,
    "wind_speed_10m": 11.5, "precipitation": 0.0}}"#;

const PARIS_DAILY: &str = r#"{"daily": {
    "time": ["2026-10-18", "2026-10-19", "2026-10-20"],
    "weather_code": [2, 61, 45],
    "temperature_2m_max": [18.0, 15.5, 13.1],
    "temperature_2m_min": [9.0, 10.2, 7.7],
    "precipitation_sum": [0.0, 6.3, 0.1],
    "wind_speed_10m_max": [12.0, 25.4, 8.9]}}"#;

fn router_for(server: &ServerGuard) -> McpRouter {
    let provider = OpenMeteo::new(
        ProviderConfig::new()
            .geocoding_url(format!("{}/v1/search", server.url()))
            .forecast_url(format!("{}/v1/forecast", server.url())),
    )
    .expect("valid provider config");
    McpRouter::new(Dispatcher::new(provider))
}

async fn mock_geocoding(server: &mut ServerGuard, body: &str, hits: usize) -> Mock {
    server
        .mock("GET", "/v1/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(hits)
        .create_async()
        .await
}

async fn mock_current(server: &mut ServerGuard, hits: usize) -> Mock {
    server
        .mock("GET", "/v1/forecast")
        .match_query(Matcher::UrlEncoded("current".into(), CURRENT_FIELDS.join(",")))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(PARIS_CURRENT)
        .expect(hits)
        .create_async()
        .await
}

async fn mock_daily(server: &mut ServerGuard, days: &str, hits: usize) -> Mock {
    server
        .mock("GET", "/v1/forecast")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("daily".into(), DAILY_FIELDS.join(",")),
            Matcher::UrlEncoded("forecast_days".into(), days.into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(PARIS_DAILY)
        .expect(hits)
        .create_async()
        .await
}

fn call(id: i64, name: &str, arguments: Value) -> JsonRpcRequest {
    JsonRpcRequest::new(id, "tools/call").with_params(json!({"name": name, "arguments": arguments}))
}

// =============================================================================
// Protocol flow
// =============================================================================

#[tokio::test]
async fn test_lifecycle_and_current_weather() {
    let mut server = Server::new_async().await;
    let geocoding = mock_geocoding(&mut server, PARIS, 1).await;
    let current = mock_current(&mut server, 1).await;

    let mut service = JsonRpcService::new(router_for(&server));

    let init = service
        .call_single(JsonRpcRequest::new(1, "initialize").with_params(json!({
            "protocolVersion": "2025-03-26",
            "capabilities": {},
            "clientInfo": {"name": "test-client", "version": "1.0.0"}
        })))
        .await;
    let init = init.result_value().expect("initialize result");
    assert_eq!(init["protocolVersion"], "2025-03-26");
    assert_eq!(init["serverInfo"]["name"], "weather-mcp");
    assert!(init["capabilities"]["tools"].is_object());

    let list = service
        .call_single(JsonRpcRequest::new(2, "tools/list").with_params(json!({})))
        .await;
    let tools = list.result_value().expect("tools/list result")["tools"]
        .as_array()
        .expect("tools array")
        .clone();
    let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();
    assert_eq!(names, vec!["get_weather", "get_forecast"]);
    assert_eq!(tools[1]["inputSchema"]["required"], json!(["city", "days"]));

    let resp = service
        .call_single(call(3, "get_weather", json!({"city": "Paris"})))
        .await;
    let result = resp.result_value().expect("tools/call result");
    assert_eq!(result["isError"], false);

    let structured = &result["structuredContent"];
    assert_eq!(structured["status"], "success");
    assert_eq!(structured["payload"]["city"], "Paris");
    assert_eq!(structured["payload"]["current"]["condition"], "cloudy");
    assert_eq!(structured["payload"]["current"]["temperature_c"], 14.2);
    let lat = structured["payload"]["coordinates"]["latitude"].as_f64().unwrap();
    assert!((lat - 48.85).abs() < 0.1);

    // The text content carries the same document
    let text = result["content"][0]["text"].as_str().expect("text content");
    let parsed: Value = serde_json::from_str(text).expect("text is JSON");
    assert_eq!(&parsed, structured);

    geocoding.assert_async().await;
    current.assert_async().await;
}

#[tokio::test]
async fn test_forecast_over_stdio() {
    let mut server = Server::new_async().await;
    let geocoding = mock_geocoding(&mut server, PARIS, 1).await;
    let daily = mock_daily(&mut server, "3", 1).await;

    let input = format!(
        "{}\n",
        json!({
            "jsonrpc": "2.0",
            "id": "f-1",
            "method": "tools/call",
            "params": {"name": "get_forecast", "arguments": {"city": "Paris", "days": 3}}
        })
    );
    let mut output = Vec::new();
    StdioTransport::new(router_for(&server))
        .serve(input.as_bytes(), &mut output)
        .await
        .expect("stdio loop exits cleanly on EOF");

    let line = String::from_utf8(output).unwrap();
    let resp: Value = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(resp["id"], "f-1");

    let payload = &resp["result"]["structuredContent"]["payload"];
    assert_eq!(payload["days"], 3);
    let entries = payload["daily"].as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["date"], "2026-10-18");
    assert_eq!(entries[1]["condition"], "rain");
    assert_eq!(entries[2]["condition"], "fog");

    geocoding.assert_async().await;
    daily.assert_async().await;
}

#[tokio::test]
async fn test_unknown_city_is_not_found() {
    let mut server = Server::new_async().await;
    let geocoding = mock_geocoding(&mut server, r#"{"generationtime_ms": 0.3}"#, 1).await;
    let current = mock_current(&mut server, 0).await;

    let mut service = JsonRpcService::new(router_for(&server));
    let resp = service
        .call_single(call(1, "get_weather", json!({"city": "Zzznotacity"})))
        .await;
    let result = resp.result_value().expect("tool errors are results");

    assert_eq!(result["isError"], true);
    assert_eq!(result["structuredContent"]["status"], "error");
    assert_eq!(result["structuredContent"]["error"]["kind"], "NotFoundError");

    geocoding.assert_async().await;
    current.assert_async().await;
}

#[tokio::test]
async fn test_invalid_arguments_make_no_provider_call() {
    let mut server = Server::new_async().await;
    let geocoding = mock_geocoding(&mut server, PARIS, 0).await;

    let mut service = JsonRpcService::new(router_for(&server));
    for (name, args) in [
        ("get_forecast", json!({"city": "Paris", "days": 0})),
        ("get_forecast", json!({"city": "Paris", "days": 17})),
        ("get_weather", json!({"city": "   "})),
        ("get_weather", json!({})),
    ] {
        let resp = service.call_single(call(1, name, args)).await;
        let result = resp.result_value().unwrap();
        assert_eq!(result["structuredContent"]["error"]["kind"], "ValidationError");
    }

    let resp = service.call_single(call(2, "get_tides", json!({"city": "Paris"}))).await;
    let result = resp.result_value().unwrap();
    assert_eq!(result["structuredContent"]["error"]["kind"], "UnknownToolError");

    geocoding.assert_async().await;
}

#[tokio::test]
async fn test_provider_failure_is_upstream() {
    let mut server = Server::new_async().await;
    let _geocoding = mock_geocoding(&mut server, PARIS, 1).await;
    let _forecast = server
        .mock("GET", "/v1/forecast")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let mut service = JsonRpcService::new(router_for(&server));
    let resp = service
        .call_single(call(1, "get_forecast", json!({"city": "Paris", "days": 2})))
        .await;
    let error = &resp.result_value().unwrap()["structuredContent"]["error"];
    assert_eq!(error["kind"], "UpstreamError");
    assert!(error["message"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn test_endpoint_batch_with_notification() {
    let mut server = Server::new_async().await;
    let _geocoding = mock_geocoding(&mut server, PARIS, 1).await;
    let _current = mock_current(&mut server, 1).await;

    let endpoint = McpEndpoint::new(router_for(&server));
    let message = endpoint
        .handle_value(
            json!([
                {"jsonrpc": "2.0", "method": "notifications/initialized"},
                {"jsonrpc": "2.0", "id": 1, "method": "ping"},
                {"jsonrpc": "2.0", "id": 2, "method": "tools/call",
                 "params": {"name": "get_weather", "arguments": {"city": "Paris"}}},
                {"jsonrpc": "2.0", "id": 3, "method": "resources/list"}
            ]),
            Extensions::new(),
        )
        .await
        .expect("batch with requests has a response");

    let responses = serde_json::to_value(&message).unwrap();
    let responses = responses.as_array().unwrap();
    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[1]["result"]["isError"], false);
    assert_eq!(responses[2]["error"]["code"], -32601);
}

// =============================================================================
// HTTP binding
// =============================================================================

#[tokio::test]
async fn test_http_requires_token_before_provider() {
    let mut server = Server::new_async().await;
    let geocoding = mock_geocoding(&mut server, PARIS, 1).await;
    let current = mock_current(&mut server, 1).await;

    let token = BearerToken::parse("integration-secret").unwrap();
    let app = HttpTransport::new(router_for(&server), AuthMode::Bearer(token)).into_router();
    let body = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": {"name": "get_weather", "arguments": {"city": "Paris"}}
    })
    .to_string();

    let rejected = app
        .clone()
        .oneshot(
            Request::post("/mcp")
                .header("content-type", "application/json")
                .body(Body::from(body.clone()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);

    let accepted = app
        .oneshot(
            Request::post("/mcp")
                .header("content-type", "application/json")
                .header("authorization", "Bearer integration-secret")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(accepted.into_body(), usize::MAX).await.unwrap();
    let resp: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(resp["result"]["structuredContent"]["status"], "success");

    // Exactly one provider round trip: the rejected request never got through
    geocoding.assert_async().await;
    current.assert_async().await;
}
