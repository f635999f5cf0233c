//! Concurrent fan-out of weather and forecast fetches over all tracked cities

use crate::api::WeatherSource;
use crate::models::{CurrentConditions, ForecastSeries};
use crate::weather::{FetchFailure, fetch_current, fetch_forecast};
use futures::future::{join, join_all};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{info, instrument};

/// Outcome of one refresh cycle.
///
/// A `None` value means the fetch for that city failed; a missing key
/// means the city was not part of the cycle.
#[derive(Debug, Clone, Default)]
pub struct AggregationResult {
    pub current: HashMap<String, Option<CurrentConditions>>,
    pub forecasts: HashMap<String, Option<ForecastSeries>>,
    /// Weather failures in city order, then forecast failures in city order
    pub failures: Vec<FetchFailure>,
}

impl AggregationResult {
    /// Message of the last failure, the one a single-line error display shows
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.failures.last().map(ToString::to_string)
    }
}

/// Fetch current conditions and forecast for every city concurrently.
///
/// Waits for every call to resolve. A failing city never affects another
/// city's results.
#[instrument(skip(source, cities), fields(cities = cities.len()))]
pub async fn aggregate(source: &dyn WeatherSource, cities: &[String]) -> AggregationResult {
    let start = Instant::now();

    let weather = join_all(cities.iter().map(|city| fetch_current(source, city)));
    let forecasts = join_all(cities.iter().map(|city| fetch_forecast(source, city)));
    let (weather, forecasts) = join(weather, forecasts).await;

    let mut result = AggregationResult::default();
    let mut forecast_failures = Vec::new();

    for (city, outcome) in cities.iter().zip(weather) {
        let value = match outcome {
            Ok(current) => Some(current),
            Err(failure) => {
                result.failures.push(failure);
                None
            }
        };
        result.current.insert(city.clone(), value);
    }
    for (city, outcome) in cities.iter().zip(forecasts) {
        let value = match outcome {
            Ok(series) => Some(series),
            Err(failure) => {
                forecast_failures.push(failure);
                None
            }
        };
        result.forecasts.insert(city.clone(), value);
    }
    result.failures.append(&mut forecast_failures);

    info!(
        "Refreshed {} cities in {:.3}s ({} failed fetches)",
        cities.len(),
        start.elapsed().as_secs_f64(),
        result.failures.len()
    );
    result
}
