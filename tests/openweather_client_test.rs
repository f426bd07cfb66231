//! HTTP behavior of the OpenWeatherMap-style client against a mock server.

use std::sync::Arc;
use std::time::Duration;
use sunshine::datasource::{DataSourceError, ForecastSource, OpenWeatherSource, Units};
use sunshine::domain::{FixedClock, NormalizedDate};
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn today() -> NormalizedDate {
    NormalizedDate::from_ymd(2024, 9, 2).unwrap()
}

fn daily_forecast(days: usize) -> serde_json::Value {
    let list: Vec<_> = (0..days)
        .map(|i| {
            serde_json::json!({
                "dt": 1725278400 + i as i64 * 86400,
                "temp": { "day": 18.0, "min": 11.0 + i as f64, "max": 21.0 + i as f64 },
                "pressure": 1016.0,
                "humidity": 64,
                "weather": [{ "id": 801, "main": "Clouds", "description": "few clouds" }],
                "speed": 4.2,
                "deg": 250
            })
        })
        .collect();
    serde_json::json!({ "cod": "200", "cnt": days, "list": list })
}

fn create_test_client(mock_server: &MockServer, units: Units, days: u32) -> OpenWeatherSource {
    OpenWeatherSource::new(
        format!("{}/daily", mock_server.uri()),
        "Berlin".to_string(),
        units,
        days,
    )
    .with_clock(Arc::new(FixedClock(today())))
    .with_retry_budget(Duration::from_millis(800))
}

async fn setup_daily_mock(mock_server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/daily"))
        .respond_with(response)
        .mount(mock_server)
        .await;
}

async fn request_count(mock_server: &MockServer) -> usize {
    mock_server.received_requests().await.unwrap().len()
}

#[tokio::test]
async fn test_fetch_sends_location_query() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/daily"))
        .and(query_param("q", "Berlin"))
        .and(query_param("mode", "json"))
        .and(query_param("units", "imperial"))
        .and(query_param("cnt", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(daily_forecast(3)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server, Units::Imperial, 3);
    let entries = client.fetch_forecast().await.unwrap();

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].date, today());
    assert_eq!(entries[2].date, today().add_days(2));
    assert_eq!(entries[1].max, 22.0);
    assert_eq!(entries[0].weather_icon_id, 801);
}

#[tokio::test]
async fn test_not_found_is_invalid_location_without_retry() {
    let mock_server = MockServer::start().await;
    setup_daily_mock(&mock_server, ResponseTemplate::new(404)).await;

    let client = create_test_client(&mock_server, Units::Metric, 14);
    let err = client.fetch_forecast().await.unwrap_err();

    assert_eq!(err, DataSourceError::InvalidLocation);
    assert_eq!(request_count(&mock_server).await, 1);
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mock_server = MockServer::start().await;
    setup_daily_mock(&mock_server, ResponseTemplate::new(401)).await;

    let client = create_test_client(&mock_server, Units::Metric, 14);
    match client.fetch_forecast().await {
        Err(DataSourceError::HttpError { status, .. }) => assert_eq!(status, 401),
        other => panic!("Expected HttpError, got {:?}", other),
    }
    assert_eq!(request_count(&mock_server).await, 1);
}

#[tokio::test]
async fn test_rate_limit_is_retried_until_budget_spent() {
    let mock_server = MockServer::start().await;
    setup_daily_mock(&mock_server, ResponseTemplate::new(429)).await;

    let client = create_test_client(&mock_server, Units::Metric, 14);
    let err = client.fetch_forecast().await.unwrap_err();

    assert_eq!(err, DataSourceError::RateLimited);
    assert!(request_count(&mock_server).await >= 2);
}

#[tokio::test]
async fn test_server_error_is_retried_until_budget_spent() {
    let mock_server = MockServer::start().await;
    setup_daily_mock(&mock_server, ResponseTemplate::new(503)).await;

    let client = create_test_client(&mock_server, Units::Metric, 14);
    match client.fetch_forecast().await {
        Err(DataSourceError::HttpError { status, .. }) => assert_eq!(status, 503),
        other => panic!("Expected HttpError, got {:?}", other),
    }
    assert!(request_count(&mock_server).await >= 2);
}

#[tokio::test]
async fn test_server_error_then_success() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/daily"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    setup_daily_mock(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(daily_forecast(2)),
    )
    .await;

    let client = create_test_client(&mock_server, Units::Metric, 2)
        .with_retry_budget(Duration::from_secs(10));
    let entries = client.fetch_forecast().await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(request_count(&mock_server).await, 2);
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let mock_server = MockServer::start().await;
    setup_daily_mock(
        &mock_server,
        ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"),
    )
    .await;

    let client = create_test_client(&mock_server, Units::Metric, 14);
    let err = client.fetch_forecast().await.unwrap_err();

    assert!(matches!(err, DataSourceError::ParseError(_)), "got {:?}", err);
    assert_eq!(request_count(&mock_server).await, 1);
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    let mock_server = MockServer::start().await;
    let uri = mock_server.uri();
    drop(mock_server);

    let client = OpenWeatherSource::new(
        format!("{}/daily", uri),
        "Berlin".to_string(),
        Units::Metric,
        14,
    )
    .with_retry_budget(Duration::from_millis(300));
    let err = client.fetch_forecast().await.unwrap_err();

    assert!(matches!(err, DataSourceError::NetworkError(_)), "got {:?}", err);
}
