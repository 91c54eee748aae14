//! Mountain catalog: the static list of locations to forecast

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::models::Mountain;
use crate::{NavigatorError, Result};

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    name: String,
    latitude: f64,
    longitude: f64,
    elevation: f64,
}

/// Built-in catalog: (name, latitude, longitude, elevation in metres)
const DEFAULT_MOUNTAINS: [(&str, f64, f64, f64); 10] = [
    ("Ben Nevis", 56.7969, -5.0036, 1345.0),
    ("Ben Macdui", 57.0704, -3.6691, 1309.0),
    ("Braeriach", 57.0783, -3.7285, 1296.0),
    ("Cairn Toul", 57.0543, -3.7107, 1291.0),
    ("Cairn Gorm", 57.1167, -3.6439, 1245.0),
    ("Ben Lawers", 56.5450, -4.2210, 1214.0),
    ("Ben More", 56.3860, -4.5403, 1174.0),
    ("Lochnagar", 56.9600, -3.2460, 1155.0),
    ("Buachaille Etive Mor", 56.6462, -4.9000, 1022.0),
    ("Ben Lomond", 56.1903, -4.6330, 974.0),
];

#[derive(Debug, Clone, PartialEq)]
pub struct MountainCatalog {
    mountains: Vec<Mountain>,
}

impl Default for MountainCatalog {
    fn default() -> Self {
        Self {
            mountains: DEFAULT_MOUNTAINS
                .iter()
                .map(|&(name, latitude, longitude, elevation)| {
                    Mountain::new(name, latitude, longitude, elevation)
                })
                .collect(),
        }
    }
}

impl MountainCatalog {
    /// Build a catalog, rejecting blank or duplicate names and invalid coordinates
    pub fn new(mountains: Vec<Mountain>) -> Result<Self> {
        let mut seen = HashSet::new();
        for mountain in &mountains {
            let name = mountain.name().trim();
            if name.is_empty() {
                return Err(NavigatorError::validation("Mountain name cannot be empty"));
            }
            if !seen.insert(name.to_string()) {
                return Err(NavigatorError::validation(format!(
                    "Mountain '{name}' appears more than once in the catalog"
                )));
            }
            if !(-90.0..=90.0).contains(&mountain.latitude()) {
                return Err(NavigatorError::validation(format!(
                    "Latitude of '{name}' must be between -90 and 90, got: {}",
                    mountain.latitude()
                )));
            }
            if !(-180.0..=180.0).contains(&mountain.longitude()) {
                return Err(NavigatorError::validation(format!(
                    "Longitude of '{name}' must be between -180 and 180, got: {}",
                    mountain.longitude()
                )));
            }
        }
        Ok(Self { mountains })
    }

    /// Parse a JSON array of `{name, latitude, longitude, elevation}`
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)
            .map_err(|e| NavigatorError::parse(format!("Failed to parse mountain catalog: {e}")))?;

        Self::new(
            entries
                .into_iter()
                .map(|e| Mountain::new(e.name, e.latitude, e.longitude, e.elevation))
                .collect(),
        )
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading mountain catalog from: {:?}", path);

        if !path.exists() {
            return Err(NavigatorError::not_found(format!(
                "Catalog file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)?;
        let catalog = Self::from_json(&content)?;
        info!("Loaded {} mountains", catalog.len());
        Ok(catalog)
    }

    #[must_use]
    pub fn mountains(&self) -> &[Mountain] {
        &self.mountains
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Mountain> {
        self.mountains.iter().find(|m| m.name() == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mountains.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mountains.is_empty()
    }
}

impl IntoIterator for MountainCatalog {
    type Item = Mountain;
    type IntoIter = std::vec::IntoIter<Mountain>;

    fn into_iter(self) -> Self::IntoIter {
        self.mountains.into_iter()
    }
}
