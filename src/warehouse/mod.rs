//! Destination side of the pipeline.
//!
//! [`Warehouse`] is the narrow set of operations the writer needs from a data
//! warehouse: create a dataset and run a load job. [`bigquery::BigQueryWarehouse`]
//! talks to BigQuery; [`memory::MemoryWarehouse`] keeps tables in process.

pub mod bigquery;
pub mod error;
pub mod memory;
pub mod writer;

use crate::warehouse::error::WarehouseError;
use async_trait::async_trait;
use polars::prelude::DataFrame;
use serde::Serialize;
use std::fmt;

/// `project.dataset`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetRef {
    pub project_id: String,
    pub dataset_id: String,
}

impl DatasetRef {
    pub fn new(project_id: impl Into<String>, dataset_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
        }
    }

    pub fn table(&self, table_id: impl Into<String>) -> TableRef {
        TableRef {
            dataset: self.clone(),
            table_id: table_id.into(),
        }
    }
}

impl fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.project_id, self.dataset_id)
    }
}

/// `project.dataset.table`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub dataset: DatasetRef,
    pub table_id: String,
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.dataset, self.table_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WriteDisposition {
    /// Replace whatever the table held.
    WriteTruncate,
    WriteAppend,
    /// Only load into a table that has no rows.
    WriteEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreateDisposition {
    CreateIfNeeded,
    CreateNever,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceFormat {
    NewlineDelimitedJson,
}

/// How a load job treats the destination table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadJobConfig {
    pub autodetect: bool,
    pub write_disposition: WriteDisposition,
    pub create_disposition: CreateDisposition,
    pub source_format: SourceFormat,
}

impl LoadJobConfig {
    /// Infer the schema, create the table if missing and replace its contents.
    pub fn replace() -> Self {
        Self {
            autodetect: true,
            write_disposition: WriteDisposition::WriteTruncate,
            create_disposition: CreateDisposition::CreateIfNeeded,
            source_format: SourceFormat::NewlineDelimitedJson,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    pub job_id: Option<String>,
    pub rows_loaded: usize,
}

#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Creates a dataset. Fails with [`WarehouseError::AlreadyExists`] when
    /// the dataset is already there.
    async fn create_dataset(
        &self,
        dataset: &DatasetRef,
        location: &str,
    ) -> Result<(), WarehouseError>;

    /// Loads `frame` into `table` and waits for the load to finish.
    async fn load_table(
        &self,
        frame: &DataFrame,
        table: &TableRef,
        config: &LoadJobConfig,
    ) -> Result<LoadOutcome, WarehouseError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refs_display() {
        let dataset = DatasetRef::new("weather-api-433410", "weather");
        assert_eq!(dataset.to_string(), "weather-api-433410.weather");
        assert_eq!(
            dataset.table("current_weather").to_string(),
            "weather-api-433410.weather.current_weather"
        );
    }

    #[test]
    fn test_replace_config_serialises_like_bigquery() {
        let value = serde_json::to_value(LoadJobConfig::replace()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "autodetect": true,
                "writeDisposition": "WRITE_TRUNCATE",
                "createDisposition": "CREATE_IF_NEEDED",
                "sourceFormat": "NEWLINE_DELIMITED_JSON"
            })
        );
    }
}
