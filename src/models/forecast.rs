//! Forecast points and the one-sample-per-day reduction

use super::TemperatureUnit;
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

/// Maximum number of days kept in a forecast series
pub const FORECAST_DAYS: usize = 5;

/// One raw forecast step as delivered by the feed (typically 3-hourly)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastPoint {
    /// Unix epoch seconds
    pub timestamp: i64,
    /// Temperature in Celsius
    pub temperature: f64,
    pub description: String,
    pub icon: String,
}

/// The representative sample for one calendar day
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastDay {
    /// Calendar day this sample stands for
    pub date: NaiveDate,
    /// Unix epoch seconds of the sample
    pub timestamp: i64,
    /// Temperature in Celsius
    pub temperature: f64,
    pub description: String,
    pub icon: String,
}

/// Up to [`FORECAST_DAYS`] days, one entry per distinct date, feed order
pub type ForecastSeries = Vec<ForecastDay>;

impl ForecastDay {
    /// Short label such as `Tue, Oct 16`
    #[must_use]
    pub fn format_date(&self) -> String {
        self.date.format("%a, %b %-d").to_string()
    }

    #[must_use]
    pub fn format_temperature(&self, unit: TemperatureUnit) -> String {
        unit.format(self.temperature)
    }
}

/// Reduce a dense feed to one point per calendar day in the local zone.
#[must_use]
pub fn reduce_to_daily(points: Vec<ForecastPoint>) -> ForecastSeries {
    reduce_to_daily_in(points, &Local)
}

/// Reduce a dense feed to one point per calendar day in `tz`.
///
/// Walks the points in feed order, keeps the first point seen for each
/// date and stops once [`FORECAST_DAYS`] dates are kept. The result is a
/// single snapshot per day, not an aggregate, and is not re-sorted.
pub fn reduce_to_daily_in<Tz: TimeZone>(points: Vec<ForecastPoint>, tz: &Tz) -> ForecastSeries {
    let mut days: ForecastSeries = Vec::with_capacity(FORECAST_DAYS);

    for point in points {
        if days.len() == FORECAST_DAYS {
            break;
        }
        let Some(utc) = DateTime::from_timestamp(point.timestamp, 0) else {
            tracing::debug!("Skipping forecast point with invalid timestamp {}", point.timestamp);
            continue;
        };
        let date = utc.with_timezone(tz).date_naive();
        if days.iter().any(|d| d.date == date) {
            continue;
        }
        days.push(ForecastDay {
            date,
            timestamp: point.timestamp,
            temperature: point.temperature,
            description: point.description,
            icon: point.icon,
        });
    }

    days
}
