//! Running extremes across every mountain's hourly data

use serde::Serialize;

use super::weather_record::HourlySeries;

pub const DEFAULT_MAX_HOURLY_PRECIPITATION: f64 = 30.0;
pub const DEFAULT_MAX_HOURLY_TEMPERATURE: f64 = 30.0;
pub const DEFAULT_MIN_HOURLY_TEMPERATURE: f64 = -10.0;

/// Cross-mountain extremes used to scale chart axes.
///
/// Values only widen as mountains are observed: maxima never decrease and the
/// minimum never increases. A mountain with an empty series contributes the
/// fallback default for that series.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ForecastExtrema {
    max_precipitation: Option<f64>,
    max_temperature: Option<f64>,
    min_apparent_temperature: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExtremaSnapshot {
    pub max_precipitation: f64,
    pub max_temperature: f64,
    pub min_temperature: f64,
}

impl ForecastExtrema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one mountain's hourly series into the running extremes
    pub fn observe(&mut self, hourly: &HourlySeries) {
        let precipitation = hourly
            .max_precipitation()
            .unwrap_or(DEFAULT_MAX_HOURLY_PRECIPITATION);
        let temperature = hourly
            .max_temperature()
            .unwrap_or(DEFAULT_MAX_HOURLY_TEMPERATURE);
        let apparent = hourly
            .min_apparent_temperature()
            .unwrap_or(DEFAULT_MIN_HOURLY_TEMPERATURE);

        self.max_precipitation =
            Some(self.max_precipitation.map_or(precipitation, |v| v.max(precipitation)));
        self.max_temperature =
            Some(self.max_temperature.map_or(temperature, |v| v.max(temperature)));
        self.min_apparent_temperature =
            Some(self.min_apparent_temperature.map_or(apparent, |v| v.min(apparent)));
    }

    /// Highest hourly precipitation seen.
    ///
    /// Reports the 30 mm fallback until the first observation, so the first
    /// loaded mountain can lower it once. From then on it never decreases.
    #[must_use]
    pub fn max_precipitation(&self) -> f64 {
        self.max_precipitation.unwrap_or(DEFAULT_MAX_HOURLY_PRECIPITATION)
    }

    #[must_use]
    pub fn max_temperature(&self) -> f64 {
        self.max_temperature.unwrap_or(DEFAULT_MAX_HOURLY_TEMPERATURE)
    }

    /// Lowest apparent temperature seen
    #[must_use]
    pub fn min_temperature(&self) -> f64 {
        self.min_apparent_temperature.unwrap_or(DEFAULT_MIN_HOURLY_TEMPERATURE)
    }

    #[must_use]
    pub fn snapshot(&self) -> ExtremaSnapshot {
        ExtremaSnapshot {
            max_precipitation: self.max_precipitation(),
            max_temperature: self.max_temperature(),
            min_temperature: self.min_temperature(),
        }
    }
}
