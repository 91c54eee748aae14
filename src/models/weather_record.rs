//! Per-mountain forecast record: hourly and daily series

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};

use super::conditions::{UNKNOWN_CONDITION, compass_point, condition_description};
use crate::{NavigatorError, Result};

/// Hourly measurements as parallel series.
///
/// The measurement series all have the same length. The timestamp axis holds
/// one more entry than the measurements: a synthetic hour after the last
/// reading, so a 168-hour forecast spans exactly seven whole days on a chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HourlySeries {
    date_times: Vec<NaiveDateTime>,
    temperature: Vec<Option<f64>>,
    apparent_temperature: Vec<Option<f64>>,
    precipitation: Vec<Option<f64>>,
    visibility: Vec<Option<f64>>,
}

impl HourlySeries {
    pub fn new(
        mut date_times: Vec<NaiveDateTime>,
        temperature: Vec<Option<f64>>,
        apparent_temperature: Vec<Option<f64>>,
        precipitation: Vec<Option<f64>>,
        visibility: Vec<Option<f64>>,
    ) -> Result<Self> {
        let expected = date_times.len();
        for (field, len) in [
            ("temperature_2m", temperature.len()),
            ("apparent_temperature", apparent_temperature.len()),
            ("precipitation", precipitation.len()),
            ("visibility", visibility.len()),
        ] {
            if len != expected {
                return Err(NavigatorError::validation(format!(
                    "hourly series '{field}' has {len} entries, expected {expected}"
                )));
            }
        }

        if let Some(last) = date_times.last().copied() {
            date_times.push(last + Duration::hours(1));
        }

        Ok(Self {
            date_times,
            temperature,
            apparent_temperature,
            precipitation,
            visibility,
        })
    }

    /// Number of hourly measurements (excludes the synthetic axis entry)
    #[must_use]
    pub fn len(&self) -> usize {
        self.temperature.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty()
    }

    /// Timestamp axis, including the trailing synthetic hour
    #[must_use]
    pub fn date_times(&self) -> &[NaiveDateTime] {
        &self.date_times
    }

    #[must_use]
    pub fn temperature(&self) -> &[Option<f64>] {
        &self.temperature
    }

    #[must_use]
    pub fn apparent_temperature(&self) -> &[Option<f64>] {
        &self.apparent_temperature
    }

    #[must_use]
    pub fn precipitation(&self) -> &[Option<f64>] {
        &self.precipitation
    }

    /// Visibility in metres
    #[must_use]
    pub fn visibility(&self) -> &[Option<f64>] {
        &self.visibility
    }

    #[must_use]
    pub fn max_precipitation(&self) -> Option<f64> {
        self.precipitation.iter().flatten().copied().reduce(f64::max)
    }

    #[must_use]
    pub fn max_temperature(&self) -> Option<f64> {
        self.temperature.iter().flatten().copied().reduce(f64::max)
    }

    #[must_use]
    pub fn min_apparent_temperature(&self) -> Option<f64> {
        self.apparent_temperature
            .iter()
            .flatten()
            .copied()
            .reduce(f64::min)
    }
}

/// One forecast day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    /// Raw WMO weather code
    pub weather_code: Option<i64>,
    /// Display description of `weather_code`
    pub condition: String,
    /// Dominant wind direction in degrees
    pub wind_direction_degrees: Option<i32>,
    /// Dominant wind direction as a compass point
    pub wind_direction: String,
    /// Maximum wind gust in km/h
    pub wind_gusts: Option<f64>,
    /// Maximum wind speed in km/h
    pub wind_speed: Option<f64>,
    /// Precipitation sum in mm
    pub precipitation_sum: Option<f64>,
}

impl DailyForecast {
    #[must_use]
    pub fn new(
        date: NaiveDate,
        weather_code: Option<i64>,
        wind_direction_degrees: Option<i32>,
        wind_gusts: Option<f64>,
        wind_speed: Option<f64>,
        precipitation_sum: Option<f64>,
    ) -> Self {
        let condition = weather_code
            .map_or(UNKNOWN_CONDITION, condition_description)
            .to_string();
        let wind_direction = wind_direction_degrees.map_or("?", compass_point).to_string();

        Self {
            date,
            weather_code,
            condition,
            wind_direction_degrees,
            wind_direction,
            wind_gusts,
            wind_speed,
            precipitation_sum,
        }
    }

    /// Weekday abbreviation, e.g. "Mon"
    #[must_use]
    pub fn day_name(&self) -> String {
        self.date.format("%a").to_string()
    }
}

/// Complete forecast for one mountain, built in a single ingestion step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherRecord {
    /// Timezone the API resolved for the location
    pub timezone: Option<String>,
    pub utc_offset_seconds: i32,
    hourly: HourlySeries,
    #[serde(serialize_with = "serialize_daily")]
    daily: BTreeMap<NaiveDate, DailyForecast>,
}

fn serialize_daily<S: Serializer>(
    daily: &BTreeMap<NaiveDate, DailyForecast>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(daily.values())
}

impl WeatherRecord {
    pub fn new(
        timezone: Option<String>,
        utc_offset_seconds: i32,
        hourly: HourlySeries,
        daily_rows: Vec<DailyForecast>,
    ) -> Result<Self> {
        let mut daily = BTreeMap::new();
        for row in daily_rows {
            let date = row.date;
            if daily.insert(date, row).is_some() {
                return Err(NavigatorError::validation(format!(
                    "daily series contains {date} more than once"
                )));
            }
        }

        Ok(Self {
            timezone,
            utc_offset_seconds,
            hourly,
            daily,
        })
    }

    #[must_use]
    pub fn hourly(&self) -> &HourlySeries {
        &self.hourly
    }

    /// Number of forecast days
    #[must_use]
    pub fn daily_len(&self) -> usize {
        self.daily.len()
    }

    /// Forecast day by index, counting from the first (earliest) date
    #[must_use]
    pub fn day(&self, index: usize) -> Option<&DailyForecast> {
        self.daily.values().nth(index)
    }

    pub fn daily(&self) -> impl Iterator<Item = &DailyForecast> {
        self.daily.values()
    }

    #[must_use]
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.daily.keys().copied().collect()
    }

    /// Weekday abbreviations of the forecast dates, in order
    #[must_use]
    pub fn days(&self) -> Vec<String> {
        self.daily.values().map(DailyForecast::day_name).collect()
    }

    #[must_use]
    pub fn daily_precipitation(&self) -> Vec<Option<f64>> {
        self.daily.values().map(|d| d.precipitation_sum).collect()
    }

    #[must_use]
    pub fn daily_weather_conditions(&self) -> Vec<&str> {
        self.daily.values().map(|d| d.condition.as_str()).collect()
    }

    #[must_use]
    pub fn daily_wind_direction(&self) -> Vec<&str> {
        self.daily
            .values()
            .map(|d| d.wind_direction.as_str())
            .collect()
    }

    #[must_use]
    pub fn daily_wind_gusts(&self) -> Vec<Option<f64>> {
        self.daily.values().map(|d| d.wind_gusts).collect()
    }

    #[must_use]
    pub fn daily_wind_speed(&self) -> Vec<Option<f64>> {
        self.daily.values().map(|d| d.wind_speed).collect()
    }
}
