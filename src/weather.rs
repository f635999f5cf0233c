//! City search, current-conditions and forecast fetchers
//!
//! These wrap a [`WeatherSource`] and fold every upstream fault into a
//! value: search falls back to no suggestions, fetches return a
//! [`FetchFailure`] carrying the message shown to the user.

use crate::api::{GEOCODE_LIMIT, WeatherSource};
use crate::models::{CurrentConditions, ForecastSeries, reduce_to_daily};
use crate::CitycastError;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Queries shorter than this never reach the network
pub const MIN_SEARCH_CHARS: usize = 3;

/// Which fetch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Weather,
    Forecast,
}

/// A folded per-city fetch fault
#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub city: String,
    pub kind: FetchKind,
    pub cause: Arc<CitycastError>,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            FetchKind::Weather => "weather",
            FetchKind::Forecast => "forecast",
        };
        write!(f, "Failed to fetch {} for {}", what, self.city)
    }
}

impl FetchFailure {
    fn new(city: &str, kind: FetchKind, cause: CitycastError) -> Self {
        let failure = Self {
            city: city.to_string(),
            kind,
            cause: Arc::new(cause),
        };
        warn!("{}: {}", failure, failure.cause);
        failure
    }
}

/// Suggest "Name, CountryCode" labels for a partially typed city name.
///
/// Best effort: short queries and upstream failures both yield an empty
/// list; this never returns an error.
#[instrument(skip(source))]
pub async fn search_cities(source: &dyn WeatherSource, query: &str) -> Vec<String> {
    if query.chars().count() < MIN_SEARCH_CHARS {
        return Vec::new();
    }

    match source.geocode(query).await {
        Ok(matches) => matches
            .iter()
            .take(GEOCODE_LIMIT)
            .map(|m| m.label())
            .collect(),
        Err(e) => {
            debug!("City search for '{}' failed: {}", query, e);
            Vec::new()
        }
    }
}

/// Fetch current conditions for one city
pub async fn fetch_current(
    source: &dyn WeatherSource,
    city: &str,
) -> Result<CurrentConditions, FetchFailure> {
    source
        .current_weather(city)
        .await
        .map_err(|e| FetchFailure::new(city, FetchKind::Weather, e))
}

/// Fetch the forecast feed for one city and reduce it to one sample per day
pub async fn fetch_forecast(
    source: &dyn WeatherSource,
    city: &str,
) -> Result<ForecastSeries, FetchFailure> {
    source
        .forecast_points(city)
        .await
        .map(reduce_to_daily)
        .map_err(|e| FetchFailure::new(city, FetchKind::Forecast, e))
}
