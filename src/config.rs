//! Configuration management for `citycast`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::CitycastError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable consulted for the API key when no
/// `CITYCAST_WEATHER__API_KEY` or config-file value is present.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Root configuration structure for `citycast`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CitycastConfig {
    /// Weather API configuration
    pub weather: WeatherConfig,
    /// City list storage configuration
    pub storage: StorageConfig,
    /// Auto-refresh configuration
    pub refresh: RefreshConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key
    pub api_key: Option<String>,
    /// Base URL for the current-conditions and forecast endpoints
    pub base_url: String,
    /// Base URL for the geocoding endpoint
    pub geo_base_url: String,
    /// Base URL for weather icon images
    pub icon_base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
}

/// Storage configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory of the city list database
    pub path: String,
}

/// Auto-refresh configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Seconds between automatic refresh cycles
    pub interval_seconds: u64,
    /// Whether auto-refresh starts enabled
    pub auto_refresh: bool,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

// Default value functions
fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_geo_base_url() -> String {
    "https://api.openweathermap.org/geo/1.0".to_string()
}

fn default_icon_base_url() -> String {
    "https://openweathermap.org/img/wn".to_string()
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_storage_path() -> String {
    dirs::data_local_dir()
        .map(|dir| dir.join("citycast").join("cities"))
        .unwrap_or_else(|| PathBuf::from(".citycast/cities"))
        .to_string_lossy()
        .into_owned()
}

fn default_refresh_interval() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            geo_base_url: default_geo_base_url(),
            icon_base_url: default_icon_base_url(),
            timeout_seconds: default_weather_timeout(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_refresh_interval(),
            auto_refresh: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl StorageConfig {
    /// Storage directory with a leading `~/` expanded to the home directory
    #[must_use]
    pub fn resolved_path(&self) -> PathBuf {
        match (self.path.strip_prefix("~/"), dirs::home_dir()) {
            (Some(rest), Some(home)) => home.join(rest),
            _ => PathBuf::from(&self.path),
        }
    }
}

impl RefreshConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl CitycastConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // CITYCAST_WEATHER__API_KEY -> weather.api_key
        builder = builder.add_source(
            Environment::with_prefix("CITYCAST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: CitycastConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        if config.weather.api_key.is_none() {
            config.weather.api_key = std::env::var(API_KEY_ENV).ok();
        }

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("citycast").join("config.toml"))
    }

    /// Apply default values to fields left empty
    pub fn apply_defaults(&mut self) {
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.geo_base_url.is_empty() {
            self.weather.geo_base_url = default_geo_base_url();
        }
        if self.weather.icon_base_url.is_empty() {
            self.weather.icon_base_url = default_icon_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_weather_timeout();
        }
        if self.storage.path.is_empty() {
            self.storage.path = default_storage_path();
        }
        if self.refresh.interval_seconds == 0 {
            self.refresh.interval_seconds = default_refresh_interval();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_key()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate the API key if one is configured
    pub fn validate_api_key(&self) -> Result<()> {
        if let Some(api_key) = &self.weather.api_key {
            if api_key.is_empty() {
                return Err(CitycastError::config(
                    "Weather API key cannot be empty if provided. Either remove it or provide a valid key."
                ).into());
            }

            if api_key.len() < 8 {
                return Err(CitycastError::config(
                    "Weather API key appears to be invalid (too short). Please check your API key."
                ).into());
            }

            if api_key.len() > 100 {
                return Err(CitycastError::config(
                    "Weather API key appears to be invalid (too long). Please check your API key."
                ).into());
            }
        }

        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds > 300 {
            return Err(CitycastError::config(
                "Weather API timeout cannot exceed 300 seconds"
            ).into());
        }

        if self.refresh.interval_seconds < 10 {
            return Err(CitycastError::config(
                "Refresh interval must be at least 10 seconds"
            ).into());
        }

        if self.refresh.interval_seconds > 86_400 {
            return Err(CitycastError::config(
                "Refresh interval cannot exceed 86400 seconds (1 day)"
            ).into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(CitycastError::config(
                format!("Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_log_levels.join(", ")
                )
            ).into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(CitycastError::config(
                format!("Invalid log format '{}'. Must be one of: {}",
                    self.logging.format,
                    valid_log_formats.join(", ")
                )
            ).into());
        }

        for (name, url) in [
            ("base", &self.weather.base_url),
            ("geocoding base", &self.weather.geo_base_url),
            ("icon base", &self.weather.icon_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(CitycastError::config(format!(
                    "Weather API {name} URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
