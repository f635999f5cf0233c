//! `citycast` - Weather dashboard for a list of tracked cities
//!
//! This library provides city search, current-conditions and forecast
//! fetching, the concurrent refresh pipeline and the dashboard service
//! that owns the tracked city list.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod display;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod storage;
pub mod telemetry;
pub mod weather;

#[cfg(test)]
mod testing;

// Re-export core types for public API
pub use api::{WeatherApiClient, WeatherSource};
pub use config::CitycastConfig;
pub use dashboard::{Dashboard, DashboardSnapshot, RefreshOutcome, RefreshPhase};
pub use error::{CitycastError, ErrorCode};
pub use models::{CurrentConditions, ForecastDay, ForecastSeries, TemperatureUnit, TrackedCityList};
pub use pipeline::{AggregationResult, aggregate};
pub use storage::{CityStore, FjallCityStore, MemoryCityStore};
pub use weather::{FetchFailure, search_cities};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, CitycastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
