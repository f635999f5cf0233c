//! Error types and handling for the `citycast` dashboard

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Classification of upstream API faults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The API credential was rejected (HTTP 401)
    ApiUnauthorized,
    /// The city or query is unknown upstream (HTTP 404)
    ApiLocationNotFound,
    /// The upstream throttled us (HTTP 429)
    ApiRateLimit,
    /// Transport failure or any other non-success status
    ApiNetworkError,
    /// The body could not be decoded into the expected shape
    ApiInvalidResponse,
}

impl ErrorCode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ApiUnauthorized => "api_unauthorized",
            ErrorCode::ApiLocationNotFound => "api_location_not_found",
            ErrorCode::ApiRateLimit => "api_rate_limit",
            ErrorCode::ApiNetworkError => "api_network_error",
            ErrorCode::ApiInvalidResponse => "api_invalid_response",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for the `citycast` library
#[derive(Error, Debug)]
pub enum CitycastError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// API communication errors
    #[error("API error ({code}): {message}")]
    Api {
        message: String,
        code: ErrorCode,
        context: HashMap<String, String>,
    },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// City list persistence errors
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl CitycastError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error without extra context
    pub fn api<S: Into<String>>(message: S, code: ErrorCode) -> Self {
        Self::api_with_context(message, code, HashMap::new())
    }

    /// Create a new API error carrying key/value context for logs
    pub fn api_with_context<S: Into<String>>(
        message: S,
        code: ErrorCode,
        context: HashMap<String, String>,
    ) -> Self {
        Self::Api {
            message: message.into(),
            code,
            context,
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// API error code, if this is an API error
    #[must_use]
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            CitycastError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            CitycastError::Config { .. } => {
                "Configuration error. Please check your config file and API key.".to_string()
            }
            CitycastError::Api { code, .. } => match code {
                ErrorCode::ApiUnauthorized => {
                    "The weather service rejected the API key.".to_string()
                }
                ErrorCode::ApiLocationNotFound => "City not found.".to_string(),
                ErrorCode::ApiRateLimit => {
                    "The weather service is throttling requests. Try again later.".to_string()
                }
                ErrorCode::ApiNetworkError | ErrorCode::ApiInvalidResponse => {
                    "Unable to reach the weather service. Please check your internet connection."
                        .to_string()
                }
            },
            CitycastError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            CitycastError::Storage { .. } => {
                "Could not read or write the saved city list.".to_string()
            }
            CitycastError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            CitycastError::General { message } => message.clone(),
        }
    }
}
