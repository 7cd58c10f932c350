//! Run configuration.
//!
//! Everything a run needs (provider key, warehouse identifiers, optional local
//! credentials, the location list) lives in one [`EtlConfig`] value that is
//! handed to each component when it is constructed. It can be read from a
//! YAML file, from the environment, or both (environment wins).

use crate::locations::{Location, LocationRegistry};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/";
pub const DEFAULT_DATASET_LOCATION: &str = "europe-west8";
pub const DEFAULT_CURRENT_TABLE: &str = "current_weather";
pub const DEFAULT_FORECAST_TABLE: &str = "forecasted_weather";

const ENV_API_KEY: &str = "OPENWEATHER_API_KEY";
const ENV_BASE_URL: &str = "OPENWEATHER_BASE_URL";
const ENV_PROJECT_ID: &str = "GCP_PROJECT_ID";
const ENV_DATASET_ID: &str = "BQ_DATASET_ID";
const ENV_DATASET_LOCATION: &str = "BQ_DATASET_LOCATION";
const ENV_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}'")]
    Parse(PathBuf, #[source] serde_yaml::Error),

    #[error("Missing required setting '{0}' (set it in the config file or via {1})")]
    Missing(&'static str, &'static str),

    #[error("Location '{0}' is defined more than once")]
    DuplicateLocation(String),

    #[error("Location '{name}' has invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates {
        name: String,
        latitude: f64,
        longitude: f64,
    },
}

/// Destination table names inside the configured dataset.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub current: String,
    pub forecast: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            current: DEFAULT_CURRENT_TABLE.to_string(),
            forecast: DEFAULT_FORECAST_TABLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawConfig {
    api_key: Option<String>,
    provider_base_url: Option<String>,
    project_id: Option<String>,
    dataset_id: Option<String>,
    dataset_location: Option<String>,
    credentials_path: Option<PathBuf>,
    #[serde(default)]
    tables: TableNames,
    locations: Option<Vec<Location>>,
}

#[derive(Debug, Clone)]
pub struct EtlConfig {
    pub api_key: String,
    pub provider_base_url: String,
    pub project_id: String,
    pub dataset_id: String,
    pub dataset_location: String,
    /// Service-account key file. Only set when running outside the managed
    /// environment; otherwise ambient credentials are used.
    pub credentials_path: Option<PathBuf>,
    pub tables: TableNames,
    pub locations: LocationRegistry,
}

impl EtlConfig {
    /// Loads a YAML config file and applies environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let raw: RawConfig = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        Self::resolve(raw, |key| std::env::var(key).ok())
    }

    /// Builds the configuration from environment variables alone.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(RawConfig::default(), |key| std::env::var(key).ok())
    }

    fn resolve(
        mut raw: RawConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty(ENV_API_KEY) {
            raw.api_key = Some(v);
        }
        if let Some(v) = non_empty(ENV_BASE_URL) {
            raw.provider_base_url = Some(v);
        }
        if let Some(v) = non_empty(ENV_PROJECT_ID) {
            raw.project_id = Some(v);
        }
        if let Some(v) = non_empty(ENV_DATASET_ID) {
            raw.dataset_id = Some(v);
        }
        if let Some(v) = non_empty(ENV_DATASET_LOCATION) {
            raw.dataset_location = Some(v);
        }
        if let Some(v) = non_empty(ENV_CREDENTIALS) {
            raw.credentials_path = Some(PathBuf::from(v));
        }

        let locations = match raw.locations {
            Some(list) => LocationRegistry::new(list)?,
            None => LocationRegistry::default(),
        };

        Ok(Self {
            api_key: raw
                .api_key
                .ok_or(ConfigError::Missing("api_key", ENV_API_KEY))?,
            provider_base_url: raw
                .provider_base_url
                .unwrap_or_else(|| DEFAULT_PROVIDER_BASE_URL.to_string()),
            project_id: raw
                .project_id
                .ok_or(ConfigError::Missing("project_id", ENV_PROJECT_ID))?,
            dataset_id: raw
                .dataset_id
                .ok_or(ConfigError::Missing("dataset_id", ENV_DATASET_ID))?,
            dataset_location: raw
                .dataset_location
                .unwrap_or_else(|| DEFAULT_DATASET_LOCATION.to_string()),
            credentials_path: raw.credentials_path,
            tables: raw.tables,
            locations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_resolve_from_env_uses_defaults() {
        let config = EtlConfig::resolve(
            RawConfig::default(),
            lookup(&[
                (ENV_API_KEY, "secret"),
                (ENV_PROJECT_ID, "weather-api-433410"),
                (ENV_DATASET_ID, "weather"),
            ]),
        )
        .unwrap();

        assert_eq!(config.api_key, "secret");
        assert_eq!(config.project_id, "weather-api-433410");
        assert_eq!(config.dataset_id, "weather");
        assert_eq!(config.dataset_location, DEFAULT_DATASET_LOCATION);
        assert_eq!(config.provider_base_url, DEFAULT_PROVIDER_BASE_URL);
        assert_eq!(config.tables, TableNames::default());
        assert!(config.credentials_path.is_none());
        assert_eq!(config.locations, LocationRegistry::default());
    }

    #[test]
    fn test_missing_api_key() {
        let result = EtlConfig::resolve(
            RawConfig::default(),
            lookup(&[(ENV_PROJECT_ID, "p"), (ENV_DATASET_ID, "d")]),
        );
        assert!(matches!(result, Err(ConfigError::Missing("api_key", _))));
    }

    #[test]
    fn test_blank_env_value_is_ignored() {
        let result = EtlConfig::resolve(
            RawConfig::default(),
            lookup(&[(ENV_API_KEY, "k"), (ENV_PROJECT_ID, "  "), (ENV_DATASET_ID, "d")]),
        );
        assert!(matches!(result, Err(ConfigError::Missing("project_id", _))));
    }

    #[test]
    fn test_load_yaml_with_env_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
api_key: from-file
project_id: file-project
dataset_id: weather
credentials_path: service_account.json
tables:
  current: now
locations:
  - name: Paris
    lat: 48.85
    lon: 2.35
"#
        )
        .unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let raw: RawConfig = serde_yaml::from_str(&content).unwrap();
        let config = EtlConfig::resolve(raw, lookup(&[(ENV_PROJECT_ID, "env-project")])).unwrap();

        assert_eq!(config.api_key, "from-file");
        assert_eq!(config.project_id, "env-project");
        assert_eq!(
            config.credentials_path.as_deref(),
            Some(Path::new("service_account.json"))
        );
        assert_eq!(config.tables.current, "now");
        assert_eq!(config.tables.forecast, DEFAULT_FORECAST_TABLE);
        assert_eq!(config.locations.len(), 1);
        assert_eq!(config.locations.get("Paris").unwrap().latitude, 48.85);
    }

    #[test]
    fn test_load_reports_parse_errors_with_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "locations: not-a-list").unwrap();
        match EtlConfig::load(file.path()) {
            Err(ConfigError::Parse(path, _)) => assert_eq!(path, file.path()),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let result = EtlConfig::load(Path::new("/definitely/not/here.yaml"));
        assert!(matches!(result, Err(ConfigError::Read(_, _))));
    }
}
