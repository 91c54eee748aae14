//! Day severity classification from wind, precipitation and conditions

use serde::{Deserialize, Serialize};

/// Wind speed (km/h) at or above which a day is bad
pub const BAD_WIND_SPEED: f64 = 40.0;
/// Precipitation (mm) at or above which a day is bad
pub const BAD_PRECIPITATION: f64 = 5.0;
pub const MARGINAL_WIND_SPEED: f64 = 20.0;
pub const MARGINAL_PRECIPITATION: f64 = 1.0;

const THUNDERSTORMS: &str = "Thunderstorms";

/// Conditions that never raise the severity on their own
const BENIGN_CONDITIONS: [&str; 5] =
    ["Clear", "Mainly Clear", "Partly cloudy", "Overcast", "Unknown"];

/// Severity of one forecast day, ordered `Ok < Marginal < Bad`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Ok,
    Marginal,
    Bad,
}

/// True when a condition description is outside the benign set
#[must_use]
pub fn is_concerning(condition: &str) -> bool {
    !BENIGN_CONDITIONS.contains(&condition)
}

/// Classify a day's signals. Any single triggering signal suffices.
#[must_use]
pub fn classify(wind_speed: f64, precipitation: f64, condition: &str) -> Severity {
    if wind_speed >= BAD_WIND_SPEED
        || precipitation >= BAD_PRECIPITATION
        || condition == THUNDERSTORMS
    {
        Severity::Bad
    } else if wind_speed >= MARGINAL_WIND_SPEED
        || precipitation >= MARGINAL_PRECIPITATION
        || is_concerning(condition)
    {
        Severity::Marginal
    } else {
        Severity::Ok
    }
}
