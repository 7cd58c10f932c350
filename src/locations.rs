//! The fixed set of places weather is collected for.
//!
//! A [`LocationRegistry`] is built once at process start, either from the
//! configuration file or from the built-in default list, and never changes
//! during a run.

use crate::config::ConfigError;
use serde::Deserialize;
use std::collections::HashSet;

/// A named point on the globe.
///
/// The name is the key used throughout a run: fetch results, log lines and
/// failure reports all refer to a location by its name.
///
/// # Examples
///
/// ```
/// use weather_etl::Location;
///
/// let paris = Location::new("Paris", 48.85, 2.35);
/// assert_eq!(paris.name, "Paris");
/// assert_eq!(paris.latitude, 48.85);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lon")]
    pub longitude: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

const DEFAULT_LOCATIONS: &[(&str, f64, f64)] = &[
    ("Milan", 45.4642, 9.19),
    ("Rome", 41.9028, 12.4964),
    ("Naples", 40.8518, 14.2681),
    ("Turin", 45.0703, 7.6869),
    ("Florence", 43.7696, 11.2558),
    ("Bologna", 44.4949, 11.3426),
    ("Venice", 45.4408, 12.3155),
    ("Palermo", 38.1157, 13.3615),
];

/// An ordered, name-unique collection of [`Location`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRegistry {
    locations: Vec<Location>,
}

impl LocationRegistry {
    /// Builds a registry, rejecting duplicate names and coordinates outside
    /// the valid latitude/longitude ranges.
    pub fn new(locations: Vec<Location>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::with_capacity(locations.len());
        for location in &locations {
            if !seen.insert(location.name.as_str()) {
                return Err(ConfigError::DuplicateLocation(location.name.clone()));
            }
            if !(-90.0..=90.0).contains(&location.latitude)
                || !(-180.0..=180.0).contains(&location.longitude)
            {
                return Err(ConfigError::InvalidCoordinates {
                    name: location.name.clone(),
                    latitude: location.latitude,
                    longitude: location.longitude,
                });
            }
        }
        Ok(Self { locations })
    }

    pub fn get(&self, name: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Location> {
        self.locations.iter()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl Default for LocationRegistry {
    fn default() -> Self {
        Self {
            locations: DEFAULT_LOCATIONS
                .iter()
                .map(|&(name, lat, lon)| Location::new(name, lat, lon))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a LocationRegistry {
    type Item = &'a Location;
    type IntoIter = std::slice::Iter<'a, Location>;

    fn into_iter(self) -> Self::IntoIter {
        self.locations.iter()
    }
}
