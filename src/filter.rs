//! Day-of-week filter: marker colors from classified forecast days

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::classifier::{Severity, classify};
use crate::models::{FetchStatus, WeatherRecord};
use crate::{NavigatorError, Result};

/// Number of selectable forecast days (today plus six)
pub const FORECAST_DAYS: usize = 7;

/// Set of selected day indices, each in `0..FORECAST_DAYS`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DaySelection(BTreeSet<usize>);

impl DaySelection {
    pub fn new<I: IntoIterator<Item = usize>>(days: I) -> Result<Self> {
        let mut selected = BTreeSet::new();
        for day in days {
            if day >= FORECAST_DAYS {
                return Err(NavigatorError::validation(format!(
                    "day index {day} is outside 0..{FORECAST_DAYS}"
                )));
            }
            selected.insert(day);
        }
        Ok(Self(selected))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, day: usize) -> bool {
        self.0.contains(&day)
    }

    /// Selected days in ascending order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}

/// Marker color pushed to the map layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MarkerColor {
    /// No filter active
    #[default]
    Base,
    /// Safe on every selected day
    Green,
    /// Marginal on some selected day, bad on none
    Orange,
    /// Bad on at least one selected day
    Red,
}

impl MarkerColor {
    /// Named color the map front end renders the pin with
    #[must_use]
    pub fn css_name(&self) -> &'static str {
        match self {
            MarkerColor::Base => "indianred",
            MarkerColor::Green => "green",
            MarkerColor::Orange => "orange",
            MarkerColor::Red => "red",
        }
    }
}

/// Borrowed view of one mountain's forecast state
#[derive(Debug, Clone, Copy)]
pub struct MountainForecast<'a> {
    pub name: &'a str,
    pub status: &'a FetchStatus,
    pub record: Option<&'a WeatherRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerAssignment {
    pub name: String,
    pub color: MarkerColor,
}

pub struct FilterEngine;

impl FilterEngine {
    /// Classify one forecast day of a record.
    ///
    /// Fails when the record has no row for `day` or the row lacks wind speed
    /// or precipitation.
    pub fn day_severity(name: &str, record: &WeatherRecord, day: usize) -> Result<Severity> {
        let insufficient = || NavigatorError::insufficient_data(name, day, record.daily_len());

        let row = record.day(day).ok_or_else(insufficient)?;
        let wind_speed = row.wind_speed.ok_or_else(insufficient)?;
        let precipitation = row.precipitation_sum.ok_or_else(insufficient)?;

        Ok(classify(wind_speed, precipitation, &row.condition))
    }

    /// Color for one mountain. Stops at the first bad day.
    pub fn color_for(
        name: &str,
        record: &WeatherRecord,
        selection: &DaySelection,
    ) -> Result<MarkerColor> {
        if selection.is_empty() {
            return Ok(MarkerColor::Base);
        }

        let mut color = MarkerColor::Green;
        for day in selection.iter() {
            match Self::day_severity(name, record, day)? {
                Severity::Bad => return Ok(MarkerColor::Red),
                Severity::Marginal => color = MarkerColor::Orange,
                Severity::Ok => {}
            }
        }
        Ok(color)
    }

    /// Recompute every mountain's color from scratch.
    ///
    /// Mountains without a loaded record stay `Base`. Any insufficient
    /// forecast fails the whole recomputation.
    pub fn apply(
        selection: &DaySelection,
        mountains: &[MountainForecast<'_>],
    ) -> Result<Vec<MarkerAssignment>> {
        mountains
            .iter()
            .map(|mountain| {
                let color = match mountain.record {
                    Some(record) if mountain.status.is_loaded() => {
                        Self::color_for(mountain.name, record, selection)?
                    }
                    _ => MarkerColor::Base,
                };
                Ok(MarkerAssignment {
                    name: mountain.name.to_string(),
                    color,
                })
            })
            .collect()
    }
}
