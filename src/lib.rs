pub mod config;
mod error;
pub mod locations;
pub mod pipeline;
pub mod server;
pub mod transform;
pub mod trigger;
mod utils;
pub mod warehouse;
pub mod weather;

pub use config::{ConfigError, EtlConfig, TableNames};
pub use error::EtlError;
pub use locations::{Location, LocationRegistry};
pub use pipeline::{RunSummary, WeatherPipeline, SUCCESS_STATUS};
pub use trigger::{invoke_remote, InboundPayload, TriggerError};
pub use utils::error_chain;

pub use transform::error::TransformError;
pub use transform::flatten::{flatten_record, Row};
pub use transform::{build_tables, WeatherTables};

pub use warehouse::bigquery::{BigQueryWarehouse, StaticToken, TokenSource};
pub use warehouse::error::WarehouseError;
pub use warehouse::memory::MemoryWarehouse;
pub use warehouse::writer::{TableWriter, WriteOutcome};
pub use warehouse::{DatasetRef, LoadJobConfig, TableRef, Warehouse};

pub use weather::client::OpenWeatherClient;
pub use weather::error::FetchError;
pub use weather::fetcher::{WeatherData, WeatherFetcher, WeatherSource};
pub use weather::types::{CurrentWeather, Endpoint, ForecastInterval, ForecastResponse};
