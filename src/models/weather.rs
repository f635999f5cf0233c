//! Current conditions snapshot

use super::TemperatureUnit;
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Current weather for one city, as last observed upstream
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CurrentConditions {
    /// Temperature in Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: u8,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Atmospheric pressure in hPa
    pub pressure: f64,
    /// Human-readable description of weather conditions
    pub description: String,
    /// Upstream icon code, e.g. `10d`
    pub icon: String,
    /// Observation time, Unix epoch seconds
    pub observed_at: i64,
}

/// Icon image URL for an upstream icon code
#[must_use]
pub fn icon_url(icon_base_url: &str, icon: &str) -> String {
    format!("{}/{}@2x.png", icon_base_url.trim_end_matches('/'), icon)
}

impl CurrentConditions {
    #[must_use]
    pub fn observed_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.observed_at, 0)
    }

    #[must_use]
    pub fn format_temperature(&self, unit: TemperatureUnit) -> String {
        unit.format(self.temperature)
    }

    #[must_use]
    pub fn format_wind(&self) -> String {
        format!("{} m/s", self.wind_speed)
    }

    #[must_use]
    pub fn format_pressure(&self) -> String {
        format!("{} hPa", self.pressure)
    }

    #[must_use]
    pub fn format_humidity(&self) -> String {
        format!("{}%", self.humidity)
    }

    /// "Last updated" timestamp in the local time zone
    #[must_use]
    pub fn format_observed_at(&self) -> String {
        self.format_observed_at_in(&Local)
    }

    pub fn format_observed_at_in<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        match self.observed_at_utc() {
            Some(utc) => utc.with_timezone(tz).format("%Y-%m-%d %H:%M:%S").to_string(),
            None => "unknown".to_string(),
        }
    }

    #[must_use]
    pub fn icon_url(&self, icon_base_url: &str) -> String {
        icon_url(icon_base_url, &self.icon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CurrentConditions {
        CurrentConditions {
            temperature: 18.6,
            humidity: 64,
            wind_speed: 3.1,
            pressure: 1015.0,
            description: "scattered clouds".to_string(),
            icon: "03d".to_string(),
            observed_at: 1_700_000_000,
        }
    }

    #[test]
    fn test_formatting() {
        let current = sample();
        assert_eq!(current.format_temperature(TemperatureUnit::Celsius), "19°C");
        assert_eq!(current.format_temperature(TemperatureUnit::Fahrenheit), "65°F");
        assert_eq!(current.format_wind(), "3.1 m/s");
        assert_eq!(current.format_pressure(), "1015 hPa");
        assert_eq!(current.format_humidity(), "64%");
    }

    #[test]
    fn test_observed_at_in_utc() {
        assert_eq!(sample().format_observed_at_in(&Utc), "2023-11-14 22:13:20");
    }

    #[test]
    fn test_icon_url() {
        assert_eq!(
            sample().icon_url("https://openweathermap.org/img/wn"),
            "https://openweathermap.org/img/wn/03d@2x.png"
        );
        assert_eq!(icon_url("http://icons/", "01n"), "http://icons/01n@2x.png");
    }
}
