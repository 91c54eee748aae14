//! Error types and handling for the conditions navigator

use thiserror::Error;

/// Main error type for the conditions navigator
#[derive(Error, Debug)]
pub enum NavigatorError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Forecast API communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Forecast payload could not be decoded
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// A selected day has no usable daily forecast row
    #[error(
        "Insufficient forecast data for {mountain}: day {day} requested, {available} days available"
    )]
    InsufficientForecastData {
        mountain: String,
        day: usize,
        available: usize,
    },

    /// Lookup by name failed
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl NavigatorError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn insufficient_data<S: Into<String>>(mountain: S, day: usize, available: usize) -> Self {
        Self::InsufficientForecastData {
            mountain: mountain.into(),
            day,
            available,
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            NavigatorError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            NavigatorError::Api { .. } => {
                "Unable to reach the forecast service. Please check your internet connection."
                    .to_string()
            }
            NavigatorError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            NavigatorError::Parse { .. } => {
                "The forecast service returned data that could not be read.".to_string()
            }
            NavigatorError::InsufficientForecastData { mountain, day, .. } => {
                format!("No forecast is available for {mountain} on day {day}.")
            }
            NavigatorError::NotFound { message } => message.clone(),
            NavigatorError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            NavigatorError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for NavigatorError {
    fn from(err: reqwest::Error) -> Self {
        NavigatorError::api(err.to_string())
    }
}

impl From<serde_json::Error> for NavigatorError {
    fn from(err: serde_json::Error) -> Self {
        NavigatorError::parse(err.to_string())
    }
}
