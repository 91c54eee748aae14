//! Application state: mountains, their forecasts, filter toggles and selection

use chrono::{Duration, Local, NaiveDate};
use futures::StreamExt;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::MountainCatalog;
use crate::filter::{DaySelection, FORECAST_DAYS, FilterEngine, MarkerColor, MountainForecast};
use crate::forecast::{ForecastSource, fetch_all};
use crate::models::{FetchStatus, ForecastExtrema, Mountain, WeatherRecord};
use crate::{NavigatorError, Result};

/// Share of the marker box height added on every side of the initial view
const VIEWPORT_BUFFER: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct MountainEntry {
    pub mountain: Mountain,
    pub status: FetchStatus,
    pub record: Option<WeatherRecord>,
    pub color: MarkerColor,
}

/// Map marker view of one mountain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub status: FetchStatus,
    pub color: MarkerColor,
}

impl From<&MountainEntry> for Marker {
    fn from(entry: &MountainEntry) -> Self {
        Self {
            name: entry.mountain.name().to_string(),
            latitude: entry.mountain.latitude(),
            longitude: entry.mountain.longitude(),
            elevation: entry.mountain.elevation(),
            status: entry.status.clone(),
            color: entry.color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterToggle {
    /// `day<N>FilterOption`, selecting day index N-1
    pub name: String,
    /// Weekday abbreviation of the day it selects
    pub label: String,
    pub checked: bool,
}

/// Map extent in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extent {
    pub min_latitude: f64,
    pub min_longitude: f64,
    pub max_latitude: f64,
    pub max_longitude: f64,
}

impl Extent {
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_latitude - self.min_latitude
    }

    /// Grow every side by `amount` degrees
    #[must_use]
    pub fn expanded(&self, amount: f64) -> Self {
        Self {
            min_latitude: self.min_latitude - amount,
            min_longitude: self.min_longitude - amount,
            max_latitude: self.max_latitude + amount,
            max_longitude: self.max_longitude + amount,
        }
    }
}

/// Outcome counts of one retrieval round
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RetrievalSummary {
    pub loaded: usize,
    pub failed: usize,
}

impl RetrievalSummary {
    pub fn tally<T>(&mut self, result: &Result<T>) {
        if result.is_ok() {
            self.loaded += 1;
        } else {
            self.failed += 1;
        }
    }
}

pub struct ConditionsNavigator {
    entries: Vec<MountainEntry>,
    extrema: ForecastExtrema,
    toggles: Vec<FilterToggle>,
    selected: Option<usize>,
}

fn toggle_name(day: usize) -> String {
    format!("day{}FilterOption", day + 1)
}

impl ConditionsNavigator {
    /// Navigator with toggles labeled from today's date
    #[must_use]
    pub fn new(catalog: MountainCatalog) -> Self {
        Self::starting_on(catalog, Local::now().date_naive())
    }

    /// Navigator with toggles labeled from `first_day` onward
    #[must_use]
    pub fn starting_on(catalog: MountainCatalog, first_day: NaiveDate) -> Self {
        let entries = catalog
            .into_iter()
            .map(|mountain| MountainEntry {
                mountain,
                status: FetchStatus::Pending,
                record: None,
                color: MarkerColor::Base,
            })
            .collect();

        let toggles = (0..FORECAST_DAYS)
            .map(|day| FilterToggle {
                name: toggle_name(day),
                label: (first_day + Duration::days(day as i64))
                    .format("%a")
                    .to_string(),
                checked: false,
            })
            .collect();

        Self {
            entries,
            extrema: ForecastExtrema::new(),
            toggles,
            selected: None,
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[MountainEntry] {
        &self.entries
    }

    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&MountainEntry> {
        self.entries.iter().find(|e| e.mountain.name() == name)
    }

    #[must_use]
    pub fn markers(&self) -> Vec<Marker> {
        self.entries.iter().map(Marker::from).collect()
    }

    #[must_use]
    pub fn extrema(&self) -> &ForecastExtrema {
        &self.extrema
    }

    /// Start a retrieval round: every mountain goes back to `Pending` and is
    /// returned for exactly one request
    pub fn forecast_requests(&mut self) -> Vec<Mountain> {
        self.entries
            .iter_mut()
            .map(|e| {
                e.status = FetchStatus::Pending;
                e.mountain.clone()
            })
            .collect()
    }

    /// Handle one forecast completion.
    ///
    /// Returns `false` when `name` is not in the catalog; the result is
    /// dropped.
    pub fn record_forecast(&mut self, name: &str, result: Result<WeatherRecord>) -> bool {
        let Some(entry) = self.entries.iter_mut().find(|e| e.mountain.name() == name) else {
            debug!("Dropping forecast for unknown mountain {}", name);
            return false;
        };

        match result {
            Ok(record) => {
                self.extrema.observe(record.hourly());
                entry.record = Some(record);
                entry.status = FetchStatus::Loaded;
            }
            Err(e) => {
                warn!("Failed to retrieve forecast for {}: {}", name, e);
                entry.record = None;
                entry.status = FetchStatus::Failed(e.to_string());
            }
        }
        true
    }

    /// Request every forecast concurrently and apply completions as they arrive
    pub async fn retrieve_forecasts<S: ForecastSource + ?Sized>(
        &mut self,
        source: &S,
    ) -> RetrievalSummary {
        let mut pending = fetch_all(source, self.forecast_requests());

        let mut summary = RetrievalSummary::default();
        while let Some((mountain, result)) = pending.next().await {
            summary.tally(&result);
            self.record_forecast(mountain.name(), result);
        }

        info!(
            "Forecast round finished: {} loaded, {} failed",
            summary.loaded, summary.failed
        );
        summary
    }

    #[must_use]
    pub fn toggles(&self) -> &[FilterToggle] {
        &self.toggles
    }

    /// Check or uncheck a toggle by its `day<N>FilterOption` name
    pub fn set_toggle(&mut self, name: &str, checked: bool) -> Result<()> {
        let toggle = self
            .toggles
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| NavigatorError::not_found(format!("Unknown filter option '{name}'")))?;
        toggle.checked = checked;
        Ok(())
    }

    /// Check exactly the toggles for `selection`
    pub fn set_selected_days(&mut self, selection: &DaySelection) {
        for (day, toggle) in self.toggles.iter_mut().enumerate() {
            toggle.checked = selection.contains(day);
        }
    }

    #[must_use]
    pub fn selected_days(&self) -> DaySelection {
        // Toggle indices are always below FORECAST_DAYS
        DaySelection::new(
            self.toggles
                .iter()
                .enumerate()
                .filter(|(_, t)| t.checked)
                .map(|(day, _)| day),
        )
        .unwrap_or_default()
    }

    /// Recompute every marker color from the checked toggles.
    ///
    /// On error no color is changed.
    pub fn filter_options_changed(&mut self) -> Result<()> {
        let selection = self.selected_days();
        self.apply_filter(&selection)
    }

    /// Make `selection` the active filter.
    ///
    /// Toggles and colors are committed together and only on success, so a
    /// failed filter leaves the previous one fully in place.
    pub fn apply_filter(&mut self, selection: &DaySelection) -> Result<()> {
        if selection.is_empty() {
            self.clear_current_filter();
            return Ok(());
        }

        let forecasts: Vec<MountainForecast<'_>> = self
            .entries
            .iter()
            .map(|e| MountainForecast {
                name: e.mountain.name(),
                status: &e.status,
                record: e.record.as_ref(),
            })
            .collect();
        let assignments = FilterEngine::apply(selection, &forecasts)?;

        for (entry, assignment) in self.entries.iter_mut().zip(assignments) {
            entry.color = assignment.color;
        }
        self.set_selected_days(selection);
        debug!(
            "Applied filter for days {:?}",
            selection.iter().collect::<Vec<_>>()
        );
        Ok(())
    }

    /// Uncheck every toggle and reset all markers to the base color
    pub fn clear_current_filter(&mut self) {
        for toggle in &mut self.toggles {
            toggle.checked = false;
        }
        for entry in &mut self.entries {
            entry.color = MarkerColor::Base;
        }
    }

    /// Select the mountain a map click hit. A miss clears the selection.
    pub fn select_mountain(&mut self, hit: Option<&str>) -> Option<&MountainEntry> {
        self.selected =
            hit.and_then(|name| self.entries.iter().position(|e| e.mountain.name() == name));
        self.selected()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&MountainEntry> {
        self.selected.and_then(|i| self.entries.get(i))
    }

    /// Bounding box of all markers, buffered by a tenth of its height
    #[must_use]
    pub fn initial_viewport(&self) -> Option<Extent> {
        let mut mountains = self.entries.iter().map(|e| &e.mountain);
        let first = mountains.next()?;

        let bounds = mountains.fold(
            Extent {
                min_latitude: first.latitude(),
                min_longitude: first.longitude(),
                max_latitude: first.latitude(),
                max_longitude: first.longitude(),
            },
            |acc, m| Extent {
                min_latitude: acc.min_latitude.min(m.latitude()),
                min_longitude: acc.min_longitude.min(m.longitude()),
                max_latitude: acc.max_latitude.max(m.latitude()),
                max_longitude: acc.max_longitude.max(m.longitude()),
            },
        );

        Some(bounds.expanded(bounds.height() * VIEWPORT_BUFFER))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyForecast, HourlySeries};
    use async_trait::async_trait;
    use chrono::NaiveDateTime;
    use std::collections::HashMap;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()
    }

    fn record(wind: f64, precipitation: f64, hourly_rain: &[f64]) -> WeatherRecord {
        let base: NaiveDateTime = start().and_hms_opt(0, 0, 0).unwrap();
        let n = hourly_rain.len();
        let hourly = HourlySeries::new(
            (0..n).map(|h| base + Duration::hours(h as i64)).collect(),
            vec![Some(10.0); n],
            vec![Some(5.0); n],
            hourly_rain.iter().copied().map(Some).collect(),
            vec![Some(20000.0); n],
        )
        .unwrap();
        let daily = (0..FORECAST_DAYS)
            .map(|d| {
                DailyForecast::new(
                    start() + Duration::days(d as i64),
                    Some(1),
                    Some(270),
                    Some(wind * 1.4),
                    Some(wind),
                    Some(precipitation),
                )
            })
            .collect();
        WeatherRecord::new(None, 0, hourly, daily).unwrap()
    }

    fn catalog() -> MountainCatalog {
        MountainCatalog::new(vec![
            Mountain::new("North", 58.0, -5.0, 1000.0),
            Mountain::new("South", 56.0, -4.0, 900.0),
            Mountain::new("East", 57.0, -3.0, 800.0),
        ])
        .unwrap()
    }

    struct FakeSource {
        records: HashMap<String, WeatherRecord>,
    }

    #[async_trait]
    impl ForecastSource for FakeSource {
        async fn fetch(&self, mountain: &Mountain) -> Result<WeatherRecord> {
            self.records
                .get(mountain.name())
                .cloned()
                .ok_or_else(|| NavigatorError::api("connection refused"))
        }
    }

    #[test]
    fn test_new_navigator_is_pending_and_unfiltered() {
        let navigator = ConditionsNavigator::starting_on(catalog(), start());
        assert!(navigator.entries().iter().all(|e| e.status == FetchStatus::Pending));
        assert!(navigator.markers().iter().all(|m| m.color == MarkerColor::Base));
        assert!(navigator.selected().is_none());
        assert!(navigator.selected_days().is_empty());
    }

    #[test]
    fn test_toggle_names_and_labels() {
        let navigator = ConditionsNavigator::starting_on(catalog(), start());
        let names: Vec<_> = navigator.toggles().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names[0], "day1FilterOption");
        assert_eq!(names[6], "day7FilterOption");
        let labels: Vec<_> = navigator.toggles().iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["Thu", "Fri", "Sat", "Sun", "Mon", "Tue", "Wed"]);
    }

    #[test]
    fn test_record_forecast_updates_status_and_extrema() {
        let mut navigator = ConditionsNavigator::starting_on(catalog(), start());

        assert!(navigator.record_forecast("North", Ok(record(5.0, 0.0, &[10.0, 2.0]))));
        assert!(navigator.record_forecast("South", Ok(record(5.0, 0.0, &[20.0]))));
        assert!(navigator.record_forecast("East", Err(NavigatorError::api("HTTP 500"))));

        assert_eq!(navigator.entry("North").unwrap().status, FetchStatus::Loaded);
        assert!(matches!(navigator.entry("East").unwrap().status, FetchStatus::Failed(_)));
        assert!(navigator.entry("East").unwrap().record.is_none());
        assert_eq!(navigator.extrema().max_precipitation(), 20.0);

        navigator.record_forecast("North", Ok(record(5.0, 0.0, &[1.0])));
        assert_eq!(navigator.extrema().max_precipitation(), 20.0);
    }

    #[test]
    fn test_forecast_requests_reset_status() {
        let mut navigator = ConditionsNavigator::starting_on(catalog(), start());
        navigator.record_forecast("North", Err(NavigatorError::api("HTTP 500")));

        let requests = navigator.forecast_requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(navigator.entry("North").unwrap().status, FetchStatus::Pending);
    }

    #[test]
    fn test_record_forecast_for_unknown_name_is_dropped() {
        let mut navigator = ConditionsNavigator::starting_on(catalog(), start());
        assert!(!navigator.record_forecast("Removed", Ok(record(5.0, 0.0, &[99.0]))));
        assert_eq!(navigator.extrema().max_precipitation(), 30.0);
    }

    #[test]
    fn test_filter_colors_and_clear() {
        let mut navigator = ConditionsNavigator::starting_on(catalog(), start());
        navigator.record_forecast("North", Ok(record(45.0, 0.0, &[0.0])));
        navigator.record_forecast("South", Ok(record(25.0, 0.0, &[0.0])));

        navigator.set_toggle("day2FilterOption", true).unwrap();
        navigator.filter_options_changed().unwrap();

        assert_eq!(navigator.entry("North").unwrap().color, MarkerColor::Red);
        assert_eq!(navigator.entry("South").unwrap().color, MarkerColor::Orange);
        // Not loaded yet
        assert_eq!(navigator.entry("East").unwrap().color, MarkerColor::Base);

        navigator.clear_current_filter();
        assert!(navigator.toggles().iter().all(|t| !t.checked));
        assert!(navigator.markers().iter().all(|m| m.color == MarkerColor::Base));
    }

    #[test]
    fn test_unchecking_every_toggle_resets_colors() {
        let mut navigator = ConditionsNavigator::starting_on(catalog(), start());
        navigator.record_forecast("North", Ok(record(5.0, 0.0, &[0.0])));
        navigator.set_selected_days(&DaySelection::new([0, 1]).unwrap());
        navigator.filter_options_changed().unwrap();
        assert_eq!(navigator.entry("North").unwrap().color, MarkerColor::Green);

        navigator.set_selected_days(&DaySelection::default());
        navigator.filter_options_changed().unwrap();
        assert_eq!(navigator.entry("North").unwrap().color, MarkerColor::Base);
    }

    #[test]
    fn test_unknown_toggle_is_rejected() {
        let mut navigator = ConditionsNavigator::starting_on(catalog(), start());
        let result = navigator.set_toggle("day8FilterOption", true);
        assert!(matches!(result, Err(NavigatorError::NotFound { .. })));
    }

    #[test]
    fn test_insufficient_data_leaves_colors_untouched() {
        let mut navigator = ConditionsNavigator::starting_on(catalog(), start());
        let short = WeatherRecord::new(
            None,
            0,
            HourlySeries::default(),
            vec![DailyForecast::new(start(), Some(0), Some(0), Some(1.0), Some(1.0), Some(0.0))],
        )
        .unwrap();
        navigator.record_forecast("North", Ok(short));
        navigator.record_forecast("South", Ok(record(45.0, 0.0, &[0.0])));

        navigator.set_selected_days(&DaySelection::new([0]).unwrap());
        navigator.filter_options_changed().unwrap();
        assert_eq!(navigator.entry("South").unwrap().color, MarkerColor::Red);

        navigator.set_selected_days(&DaySelection::new([3]).unwrap());
        let err = navigator.filter_options_changed().unwrap_err();
        assert!(matches!(err, NavigatorError::InsufficientForecastData { day: 3, .. }));
        assert_eq!(navigator.entry("North").unwrap().color, MarkerColor::Green);
        assert_eq!(navigator.entry("South").unwrap().color, MarkerColor::Red);
    }

    #[test]
    fn test_failed_filter_keeps_previous_toggles() {
        let mut navigator = ConditionsNavigator::starting_on(catalog(), start());
        let short = WeatherRecord::new(
            None,
            0,
            HourlySeries::default(),
            vec![DailyForecast::new(start(), Some(0), Some(0), Some(1.0), Some(1.0), Some(0.0))],
        )
        .unwrap();
        navigator.record_forecast("North", Ok(short));

        navigator
            .apply_filter(&DaySelection::new([0]).unwrap())
            .unwrap();
        let result = navigator.apply_filter(&DaySelection::new([5]).unwrap());

        assert!(matches!(
            result,
            Err(NavigatorError::InsufficientForecastData { day: 5, .. })
        ));
        assert_eq!(navigator.selected_days(), DaySelection::new([0]).unwrap());
        assert_eq!(navigator.entry("North").unwrap().color, MarkerColor::Green);
    }

    #[test]
    fn test_select_mountain() {
        let mut navigator = ConditionsNavigator::starting_on(catalog(), start());
        let selected = navigator.select_mountain(Some("South")).unwrap();
        assert_eq!(selected.mountain.name(), "South");

        assert!(navigator.select_mountain(Some("Atlantis")).is_none());
        assert!(navigator.selected().is_none());

        navigator.select_mountain(Some("East"));
        assert!(navigator.select_mountain(None).is_none());
    }

    #[test]
    fn test_initial_viewport_is_buffered_by_height() {
        let navigator = ConditionsNavigator::starting_on(catalog(), start());
        let extent = navigator.initial_viewport().unwrap();

        // Markers span 56..58 lat, -5..-3 lon; buffer is 0.2 degrees
        assert!((extent.min_latitude - 55.8).abs() < 1e-9);
        assert!((extent.max_latitude - 58.2).abs() < 1e-9);
        assert!((extent.min_longitude + 5.2).abs() < 1e-9);
        assert!((extent.max_longitude + 2.8).abs() < 1e-9);
    }

    #[test]
    fn test_initial_viewport_empty_catalog() {
        let navigator = ConditionsNavigator::new(MountainCatalog::new(vec![]).unwrap());
        assert!(navigator.initial_viewport().is_none());
    }

    #[tokio::test]
    async fn test_retrieve_forecasts_applies_every_completion() {
        let mut records = HashMap::new();
        records.insert("North".to_string(), record(5.0, 0.0, &[10.0]));
        records.insert("South".to_string(), record(5.0, 0.0, &[20.0]));
        let source = FakeSource { records };

        let mut navigator = ConditionsNavigator::starting_on(catalog(), start());
        let summary = navigator.retrieve_forecasts(&source).await;

        assert_eq!(summary, RetrievalSummary { loaded: 2, failed: 1 });
        assert_eq!(navigator.entry("South").unwrap().status, FetchStatus::Loaded);
        assert_eq!(
            navigator.entry("East").unwrap().status,
            FetchStatus::Failed("API error: connection refused".to_string())
        );
        assert_eq!(navigator.extrema().max_precipitation(), 20.0);
    }
}
