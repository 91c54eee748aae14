//! Mountain model: identity and static facts

use serde::{Deserialize, Serialize};

/// A named mountain location
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Mountain {
    name: String,
    latitude: f64,
    longitude: f64,
    /// Summit elevation in metres
    elevation: f64,
}

impl Mountain {
    #[must_use]
    pub fn new<S: Into<String>>(name: S, latitude: f64, longitude: f64, elevation: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            elevation,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    #[must_use]
    pub fn elevation(&self) -> f64 {
        self.elevation
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Generate cache key for a forecast fetched on `date`
    #[must_use]
    pub fn cache_key(&self, date: &str) -> String {
        format!(
            "forecast:{:.4}:{:.4}:{:.0}:{date}",
            self.latitude, self.longitude, self.elevation
        )
    }
}

/// Outcome of the most recent forecast request for a mountain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum FetchStatus {
    /// Requested, no response yet
    #[default]
    Pending,
    /// A record is available
    Loaded,
    /// The last request failed; no record is held
    Failed(String),
}

impl FetchStatus {
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self, FetchStatus::Loaded)
    }
}
