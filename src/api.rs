//! Weather API client for OpenWeatherMap
//!
//! HTTP client for current conditions, the 3-hourly forecast feed and
//! city-name geocoding. Calls are neither retried nor rate limited; a failed
//! call stays failed until the next refresh trigger.

use crate::config::WeatherConfig;
use crate::models::openweather::{CurrentResponse, ForecastResponse, GeocodingMatch};
use crate::models::{CurrentConditions, ForecastPoint};
use crate::{CitycastError, ErrorCode, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Number of geocoding suggestions requested upstream
pub const GEOCODE_LIMIT: usize = 5;

/// Upstream weather data source.
///
/// The fetchers and the aggregation pipeline only talk to this trait, so
/// tests can substitute an in-memory source.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Current conditions for a city name
    async fn current_weather(&self, city: &str) -> Result<CurrentConditions>;
    /// Dense forecast feed for a city name, in feed order
    async fn forecast_points(&self, city: &str) -> Result<Vec<ForecastPoint>>;
    /// Geocoding matches for a partial city name
    async fn geocode(&self, query: &str) -> Result<Vec<GeocodingMatch>>;
}

/// OpenWeatherMap HTTP client
#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    client: Client,
    api_key: String,
    base_url: String,
    geo_base_url: String,
}

impl WeatherApiClient {
    /// Create a new client. Fails if no API key is configured.
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            CitycastError::config(format!(
                "Missing weather API key. Set CITYCAST_WEATHER__API_KEY or {}.",
                crate::config::API_KEY_ENV
            ))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("citycast/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CitycastError::general(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            geo_base_url: config.geo_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn weather_url(&self, endpoint: &str, city: &str) -> Result<String> {
        if city.trim().is_empty() {
            return Err(CitycastError::validation("City name must not be empty"));
        }
        Ok(format!(
            "{}/{}?q={}&units=metric&APPID={}",
            self.base_url,
            endpoint,
            urlencoding::encode(city),
            self.api_key
        ))
    }

    /// Issue a GET and map non-success statuses to API errors
    #[instrument(skip(self, url))]
    async fn make_request(&self, endpoint: &str, url: &str) -> Result<Response> {
        let start = Instant::now();

        let response = self.client.get(url).send().await.map_err(|e| {
            // the URL carries the API key
            let e = e.without_url();
            warn!(
                "Network error after {:.3}s: {}",
                start.elapsed().as_secs_f64(),
                e
            );
            CitycastError::api_with_context(
                format!("Network error: {e}"),
                ErrorCode::ApiNetworkError,
                HashMap::from([("endpoint".to_string(), endpoint.to_string())]),
            )
        })?;

        let status = response.status();
        debug!(
            "HTTP response received: {} in {:.3}s",
            status,
            start.elapsed().as_secs_f64()
        );

        if status.is_success() {
            return Ok(response);
        }

        let code = match status.as_u16() {
            401 => ErrorCode::ApiUnauthorized,
            404 => ErrorCode::ApiLocationNotFound,
            429 => ErrorCode::ApiRateLimit,
            _ => ErrorCode::ApiNetworkError,
        };
        warn!("Request to {} failed with status {}", endpoint, status);

        Err(CitycastError::api_with_context(
            format!(
                "API request failed with status: {} - {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown error")
            ),
            code,
            HashMap::from([
                ("endpoint".to_string(), endpoint.to_string()),
                ("status_code".to_string(), status.as_u16().to_string()),
            ]),
        ))
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, url: &str) -> Result<T> {
        let response = self.make_request(endpoint, url).await?;
        response.json::<T>().await.map_err(|e| {
            warn!("Failed to parse {} response: {}", endpoint, e);
            CitycastError::api_with_context(
                format!("Invalid {endpoint} data received from OpenWeatherMap"),
                ErrorCode::ApiInvalidResponse,
                HashMap::from([("endpoint".to_string(), endpoint.to_string())]),
            )
        })
    }
}

fn missing_condition(endpoint: &str, city: &str) -> CitycastError {
    CitycastError::api_with_context(
        format!("{endpoint} payload has no weather condition"),
        ErrorCode::ApiInvalidResponse,
        HashMap::from([("city".to_string(), city.to_string())]),
    )
}

#[async_trait]
impl WeatherSource for WeatherApiClient {
    #[instrument(skip(self))]
    async fn current_weather(&self, city: &str) -> Result<CurrentConditions> {
        let start = Instant::now();
        let url = self.weather_url("weather", city)?;

        let response: CurrentResponse = self.get_json("weather", &url).await?;
        let current =
            CurrentConditions::try_from(response).map_err(|_| missing_condition("weather", city))?;

        info!(
            "Retrieved current weather for '{}' in {:.3}s",
            city,
            start.elapsed().as_secs_f64()
        );
        Ok(current)
    }

    #[instrument(skip(self))]
    async fn forecast_points(&self, city: &str) -> Result<Vec<ForecastPoint>> {
        let start = Instant::now();
        let url = self.weather_url("forecast", city)?;

        let response: ForecastResponse = self.get_json("forecast", &url).await?;
        let points = response
            .list
            .into_iter()
            .map(ForecastPoint::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| missing_condition("forecast", city))?;

        info!(
            "Retrieved forecast with {} data points for '{}' in {:.3}s",
            points.len(),
            city,
            start.elapsed().as_secs_f64()
        );
        Ok(points)
    }

    #[instrument(skip(self))]
    async fn geocode(&self, query: &str) -> Result<Vec<GeocodingMatch>> {
        let url = format!(
            "{}/direct?q={}&limit={}&appid={}",
            self.geo_base_url,
            urlencoding::encode(query),
            GEOCODE_LIMIT,
            self.api_key
        );

        let matches: Vec<GeocodingMatch> = self.get_json("direct", &url).await?;
        debug!("Found {} geocoding results for '{}'", matches.len(), query);
        Ok(matches)
    }
}
