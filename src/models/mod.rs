//! Data models for the conditions navigator
//!
//! This module contains the core domain models organized by concern:
//! - Mountain: identity and static location facts
//! - Conditions: weather code and wind direction lookup tables
//! - WeatherRecord: hourly and daily forecast series for one mountain
//! - Extrema: running cross-mountain extremes used for chart axes

pub mod conditions;
pub mod extrema;
pub mod mountain;
pub mod weather_record;

// Re-export all public types for convenient access
pub use conditions::{compass_point, condition_description};
pub use extrema::{ExtremaSnapshot, ForecastExtrema};
pub use mountain::{FetchStatus, Mountain};
pub use weather_record::{DailyForecast, HourlySeries, WeatherRecord};
