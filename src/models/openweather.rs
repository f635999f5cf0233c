//! OpenWeatherMap API response structures and conversions

use super::{CurrentConditions, ForecastPoint};
use serde::Deserialize;

/// `GET /weather` response (only the fields the dashboard uses)
#[derive(Debug, Deserialize)]
pub struct CurrentResponse {
    pub main: MainData,
    pub wind: WindData,
    pub weather: Vec<ConditionData>,
    pub dt: i64,
}

/// `GET /forecast` response
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub list: Vec<ForecastEntry>,
}

/// One 3-hourly forecast step
#[derive(Debug, Deserialize)]
pub struct ForecastEntry {
    pub main: MainData,
    pub weather: Vec<ConditionData>,
    pub dt: i64,
}

#[derive(Debug, Deserialize)]
pub struct MainData {
    pub temp: f64,
    #[serde(default)]
    pub humidity: Option<u8>,
    #[serde(default)]
    pub pressure: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct WindData {
    pub speed: f64,
}

#[derive(Debug, Deserialize)]
pub struct ConditionData {
    pub description: String,
    pub icon: String,
}

/// `GET /direct` geocoding match
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GeocodingMatch {
    pub name: String,
    pub country: String,
}

impl GeocodingMatch {
    /// "Name, CountryCode" suggestion label
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }
}

/// A payload arrived without its `weather[0]` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingCondition;

impl TryFrom<CurrentResponse> for CurrentConditions {
    type Error = MissingCondition;

    fn try_from(response: CurrentResponse) -> Result<Self, Self::Error> {
        let condition = response.weather.into_iter().next().ok_or(MissingCondition)?;
        Ok(Self {
            temperature: response.main.temp,
            humidity: response.main.humidity.unwrap_or_default(),
            wind_speed: response.wind.speed,
            pressure: response.main.pressure.unwrap_or_default(),
            description: condition.description,
            icon: condition.icon,
            observed_at: response.dt,
        })
    }
}

impl TryFrom<ForecastEntry> for ForecastPoint {
    type Error = MissingCondition;

    fn try_from(entry: ForecastEntry) -> Result<Self, Self::Error> {
        let condition = entry.weather.into_iter().next().ok_or(MissingCondition)?;
        Ok(Self {
            timestamp: entry.dt,
            temperature: entry.main.temp,
            description: condition.description,
            icon: condition.icon,
        })
    }
}
