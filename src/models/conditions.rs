//! Lookup tables for daily weather codes and wind directions

/// Description used for codes missing from the table
pub const UNKNOWN_CONDITION: &str = "Unknown";

/// Convert an Open-Meteo WMO weather code to its display description
#[must_use]
pub fn condition_description(code: i64) -> &'static str {
    match code {
        0 => "Clear",
        1 => "Mainly Clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Fog (with rime)",
        51 => "Drizzle (light)",
        53 => "Drizzle (moderate)",
        55 => "Drizzle (dense)",
        56 | 57 => "Drizzle (freezing)",
        61 => "Rain (slight)",
        63 => "Rain (moderate)",
        65 => "Rain (heavy)",
        66 | 67 => "Rain (freezing)",
        71 => "Snow (slight)",
        73 => "Snow (moderate)",
        75 => "Snow (heavy)",
        77 => "Snow",
        80 => "Rain Showers (slight)",
        81 => "Rain Showers (moderate)",
        82 => "Rain Showers (violent)",
        85 | 86 => "Snow Showers",
        95 | 96 | 99 => "Thunderstorms",
        _ => UNKNOWN_CONDITION,
    }
}

/// Convert wind direction in degrees to one of eight compass points.
///
/// Values outside 0..=360 yield `"?"`.
#[must_use]
pub fn compass_point(degrees: i32) -> &'static str {
    match degrees {
        0..=22 | 338..=360 => "N",
        23..=67 => "NE",
        68..=112 => "E",
        113..=157 => "SE",
        158..=202 => "S",
        203..=247 => "SW",
        248..=292 => "W",
        293..=337 => "NW",
        _ => "?",
    }
}
