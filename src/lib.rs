//! Conditions navigator - mountain weather conditions at a glance
//!
//! This library fetches multi-day Open-Meteo forecasts for a catalog of
//! mountains, classifies each day as ok, marginal or bad, and colors map
//! markers by the days a user selects.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod error;
pub mod filter;
pub mod forecast;
pub mod models;
pub mod navigator;
pub mod web;

// Re-export core types for public API
pub use cache::ForecastCache;
pub use catalog::MountainCatalog;
pub use classifier::{Severity, classify};
pub use config::NavigatorConfig;
pub use error::NavigatorError;
pub use filter::{DaySelection, FilterEngine, MarkerColor};
pub use forecast::{ForecastSource, OpenMeteoForecastSource, parse_forecast};
pub use models::{FetchStatus, ForecastExtrema, Mountain, WeatherRecord};
pub use navigator::{ConditionsNavigator, Extent, Marker, RetrievalSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, NavigatorError>;
