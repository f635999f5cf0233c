//! In-memory weather source for unit tests

use crate::api::WeatherSource;
use crate::models::{CurrentConditions, ForecastPoint, GeocodingMatch};
use crate::{CitycastError, ErrorCode, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Notify, Semaphore};

// 2024-03-01T00:00:00Z
const START: i64 = 1_709_251_200;

#[derive(Default)]
pub(crate) struct FakeSource {
    current: HashMap<String, CurrentConditions>,
    forecasts: HashMap<String, Vec<ForecastPoint>>,
    suggestions: Vec<GeocodingMatch>,
    search_fails: bool,
    panics_on: HashSet<String>,
    pub current_calls: AtomicUsize,
    pub forecast_calls: AtomicUsize,
    pub geocode_calls: AtomicUsize,
}

pub(crate) fn conditions(temperature: f64) -> CurrentConditions {
    CurrentConditions {
        temperature,
        humidity: 50,
        wind_speed: 2.5,
        pressure: 1013.0,
        description: "clear sky".to_string(),
        icon: "01d".to_string(),
        observed_at: START,
    }
}

/// Six days of 3-hourly points
pub(crate) fn dense_feed(base_temperature: f64) -> Vec<ForecastPoint> {
    (0..48)
        .map(|i| ForecastPoint {
            timestamp: START + i * 3 * 3600,
            temperature: base_temperature + i as f64,
            description: "few clouds".to_string(),
            icon: "02d".to_string(),
        })
        .collect()
}

impl FakeSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A city with both current conditions and a forecast feed
    pub(crate) fn with_city(mut self, city: &str, temperature: f64) -> Self {
        self.current.insert(city.to_string(), conditions(temperature));
        self.forecasts.insert(city.to_string(), dense_feed(temperature));
        self
    }

    /// A city whose forecast exists but whose current conditions 404
    pub(crate) fn with_forecast_only(mut self, city: &str, temperature: f64) -> Self {
        self.forecasts.insert(city.to_string(), dense_feed(temperature));
        self
    }

    pub(crate) fn with_suggestions(mut self, labels: &[(&str, &str)]) -> Self {
        self.suggestions = labels
            .iter()
            .map(|(name, country)| GeocodingMatch {
                name: name.to_string(),
                country: country.to_string(),
            })
            .collect();
        self
    }

    pub(crate) fn with_failing_search(mut self) -> Self {
        self.search_fails = true;
        self
    }

    /// Panic while fetching this city, simulating an unexpected fault
    pub(crate) fn panicking_on(mut self, city: &str) -> Self {
        self.panics_on.insert(city.to_string());
        self
    }

    pub(crate) fn calls(&self) -> (usize, usize) {
        (
            self.current_calls.load(Ordering::SeqCst),
            self.forecast_calls.load(Ordering::SeqCst),
        )
    }
}

fn not_found(city: &str) -> CitycastError {
    CitycastError::api(format!("{city} not found"), ErrorCode::ApiLocationNotFound)
}

#[async_trait]
impl WeatherSource for FakeSource {
    async fn current_weather(&self, city: &str) -> Result<CurrentConditions> {
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        if self.panics_on.contains(city) {
            panic!("fake source exploded on {city}");
        }
        self.current.get(city).cloned().ok_or_else(|| not_found(city))
    }

    async fn forecast_points(&self, city: &str) -> Result<Vec<ForecastPoint>> {
        self.forecast_calls.fetch_add(1, Ordering::SeqCst);
        if self.panics_on.contains(city) {
            panic!("fake source exploded on {city}");
        }
        self.forecasts.get(city).cloned().ok_or_else(|| not_found(city))
    }

    async fn geocode(&self, _query: &str) -> Result<Vec<GeocodingMatch>> {
        self.geocode_calls.fetch_add(1, Ordering::SeqCst);
        if self.search_fails {
            return Err(CitycastError::api("boom", ErrorCode::ApiNetworkError));
        }
        Ok(self.suggestions.clone())
    }
}

/// Holds current-conditions fetches for one city until released
pub(crate) struct GatedSource {
    inner: FakeSource,
    gated: String,
    gate: Semaphore,
    pub entered: Notify,
}

impl GatedSource {
    pub(crate) fn new(inner: FakeSource, gated: &str) -> Self {
        Self {
            inner,
            gated: gated.to_string(),
            gate: Semaphore::new(0),
            entered: Notify::new(),
        }
    }

    /// Open the gate for every waiting and later fetch
    pub(crate) fn release(&self) {
        self.gate.close();
    }
}

#[async_trait]
impl WeatherSource for GatedSource {
    async fn current_weather(&self, city: &str) -> Result<CurrentConditions> {
        if city == self.gated {
            self.entered.notify_one();
            // a closed gate lets every fetch through
            let _ = self.gate.acquire().await;
        }
        self.inner.current_weather(city).await
    }

    async fn forecast_points(&self, city: &str) -> Result<Vec<ForecastPoint>> {
        self.inner.forecast_points(city).await
    }

    async fn geocode(&self, query: &str) -> Result<Vec<GeocodingMatch>> {
        self.inner.geocode(query).await
    }
}
