//! Data models for the weather dashboard
//!
//! - Cities: the tracked city list
//! - Weather: current conditions snapshots
//! - Forecast: forecast points and the daily reduction
//! - Units: Celsius/Fahrenheit display conversion
//! - OpenWeather: upstream wire types

pub mod cities;
pub mod forecast;
pub mod openweather;
pub mod units;
pub mod weather;

pub use cities::TrackedCityList;
pub use forecast::{
    FORECAST_DAYS, ForecastDay, ForecastPoint, ForecastSeries, reduce_to_daily, reduce_to_daily_in,
};
pub use openweather::GeocodingMatch;
pub use units::TemperatureUnit;
pub use weather::{CurrentConditions, icon_url};
