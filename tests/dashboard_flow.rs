//! End-to-end refresh cycles over the HTTP client and a mock upstream

use citycast::config::WeatherConfig;
use citycast::display::render_dashboard;
use citycast::{Dashboard, MemoryCityStore, RefreshPhase, WeatherApiClient};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "flow_test_key";

fn current_json(temp: f64, description: &str) -> serde_json::Value {
    serde_json::json!({
        "main": {"temp": temp, "humidity": 55, "pressure": 1020},
        "wind": {"speed": 2.0},
        "weather": [{"description": description, "icon": "01d"}],
        "dt": 1_700_000_000
    })
}

fn forecast_json(temp: f64) -> serde_json::Value {
    let list: Vec<_> = (0..40)
        .map(|i| {
            serde_json::json!({
                "dt": 1_700_000_000 + i * 3 * 3600,
                "main": {"temp": temp + i as f64},
                "weather": [{"description": "clear sky", "icon": "01d"}]
            })
        })
        .collect();
    serde_json::json!({ "cod": "200", "list": list })
}

async fn mount_city(server: &MockServer, city: &str, temp: f64) {
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", city))
        .and(query_param("APPID", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_json(temp, "clear sky")))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("q", city))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json(temp)))
        .mount(server)
        .await;
}

async fn dashboard_for(server: &MockServer, cities: &[&str]) -> Arc<Dashboard> {
    let config = WeatherConfig {
        api_key: Some(KEY.to_string()),
        base_url: server.uri(),
        geo_base_url: server.uri(),
        ..WeatherConfig::default()
    };
    let client = Arc::new(WeatherApiClient::new(&config).unwrap());
    let store = Arc::new(MemoryCityStore::with_cities(cities.iter().copied()));
    Dashboard::restore(client, store, Duration::from_secs(300)).await
}

#[tokio::test]
async fn test_partial_failure_keeps_other_cities() {
    let server = MockServer::start().await;
    mount_city(&server, "Paris", 12.0).await;
    Mock::given(method("GET"))
        .and(query_param("q", "Atlantis"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dashboard = dashboard_for(&server, &["Paris", "Atlantis"]).await;
    dashboard.refresh().await;
    let snapshot = dashboard.snapshot();

    assert_eq!(snapshot.phase, RefreshPhase::Settled);
    assert_eq!(snapshot.current_for("Paris").map(|c| c.temperature), Some(12.0));
    let series = snapshot.forecast_for("Paris").unwrap();
    assert!(!series.is_empty() && series.len() <= 5);
    assert_eq!(snapshot.current.get("Atlantis"), Some(&None));
    assert_eq!(snapshot.forecasts.get("Atlantis"), Some(&None));
    assert_eq!(
        snapshot.error.as_deref(),
        Some("Failed to fetch forecast for Atlantis")
    );

    let rendered = render_dashboard(&snapshot, "https://icons.test");
    assert!(rendered.contains("No data available"));
    assert!(rendered.contains("No forecast available"));
    assert!(rendered.contains("https://icons.test/01d@2x.png"));
}

#[tokio::test]
async fn test_search_through_dashboard() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/direct"))
        .and(query_param("q", "Par"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"name": "Paris", "country": "FR"},
            {"name": "Paris", "country": "US"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = dashboard_for(&server, &[]).await;

    assert!(dashboard.search("Pa").await.is_empty());
    assert_eq!(dashboard.search("Par").await, vec!["Paris, FR", "Paris, US"]);
}

#[tokio::test]
async fn test_search_upstream_error_is_swallowed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/direct"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dashboard = dashboard_for(&server, &[]).await;
    assert!(dashboard.search("Berlin").await.is_empty());
}

#[tokio::test]
async fn test_add_and_remove_round_trip() {
    let server = MockServer::start().await;
    mount_city(&server, "Oslo", 1.0).await;
    mount_city(&server, "Lima", 19.0).await;

    let dashboard = dashboard_for(&server, &["Oslo"]).await;
    assert!(dashboard.add_city("Lima").await);
    assert!(dashboard.snapshot().current_for("Oslo").is_some());
    assert!(dashboard.snapshot().current_for("Lima").is_some());

    assert!(dashboard.remove_city("Oslo").await);
    let snapshot = dashboard.snapshot();
    assert_eq!(snapshot.cities.as_slice(), ["Lima"]);
    assert!(!snapshot.current.contains_key("Oslo"));
    assert!(!snapshot.forecasts.contains_key("Oslo"));
}
