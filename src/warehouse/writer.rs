use crate::config::DEFAULT_DATASET_LOCATION;
use crate::transform::frame::describe_columns;
use crate::utils::error_chain;
use crate::warehouse::error::WarehouseError;
use crate::warehouse::{DatasetRef, LoadJobConfig, Warehouse};
use bon::bon;
use log::{error, info};
use polars::prelude::DataFrame;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub rows: usize,
    pub job_id: Option<String>,
}

/// Writes frames into tables of a single dataset, replacing their contents.
pub struct TableWriter<W> {
    warehouse: W,
    dataset: DatasetRef,
    dataset_location: String,
}

#[bon]
impl<W: Warehouse> TableWriter<W> {
    #[builder]
    pub fn new(
        warehouse: W,
        #[builder(into)] project_id: String,
        #[builder(into)] dataset_id: String,
        #[builder(into)] dataset_location: Option<String>,
    ) -> Self {
        Self {
            warehouse,
            dataset: DatasetRef::new(project_id, dataset_id),
            dataset_location: dataset_location
                .unwrap_or_else(|| DEFAULT_DATASET_LOCATION.to_string()),
        }
    }

    pub fn dataset(&self) -> &DatasetRef {
        &self.dataset
    }

    pub fn warehouse(&self) -> &W {
        &self.warehouse
    }

    /// Creates the dataset unless it already exists.
    pub async fn ensure_dataset(&self) -> Result<(), WarehouseError> {
        match self
            .warehouse
            .create_dataset(&self.dataset, &self.dataset_location)
            .await
        {
            Ok(()) => {
                info!(
                    "Created dataset {} in {}",
                    self.dataset, self.dataset_location
                );
                Ok(())
            }
            Err(WarehouseError::AlreadyExists(_)) => {
                info!("Dataset {} already exists", self.dataset);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Replaces the contents of `table_name` with `frame`.
    ///
    /// Ensures the dataset first. An empty frame fails with
    /// [`WarehouseError::NothingToLoad`] and the table keeps its old rows.
    pub async fn write(
        &self,
        frame: &DataFrame,
        table_name: &str,
    ) -> Result<WriteOutcome, WarehouseError> {
        self.ensure_dataset().await?;

        let table = self.dataset.table(table_name);
        let config = LoadJobConfig::replace();
        let result = if frame.height() == 0 {
            Err(WarehouseError::NothingToLoad(table.to_string()))
        } else {
            self.warehouse.load_table(frame, &table, &config).await
        };

        match result {
            Ok(outcome) => {
                info!("Loaded {} rows into {}", outcome.rows_loaded, table);
                Ok(WriteOutcome {
                    rows: outcome.rows_loaded,
                    job_id: outcome.job_id,
                })
            }
            Err(e) => {
                error!("Failed to write to {}: {}", table, error_chain(&e));
                error!("Frame columns: {}", describe_columns(frame));
                error!("Load job config: {:?}", config);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::memory::MemoryWarehouse;
    use crate::warehouse::{LoadOutcome, TableRef};
    use async_trait::async_trait;
    use polars::df;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn writer(warehouse: MemoryWarehouse) -> TableWriter<MemoryWarehouse> {
        TableWriter::builder()
            .warehouse(warehouse)
            .project_id("weather-api")
            .dataset_id("weather")
            .build()
    }

    #[tokio::test]
    async fn test_write_creates_dataset_and_loads() {
        let warehouse = MemoryWarehouse::new();
        let writer = writer(warehouse.clone());
        let frame = df!("name" => ["Rome", "Milan"], "temp" => [18.2, 14.9]).unwrap();

        let outcome = writer.write(&frame, "current_weather").await.unwrap();

        assert_eq!(outcome.rows, 2);
        assert_eq!(outcome.job_id.as_deref(), Some("memory-1"));
        assert!(warehouse.has_dataset(writer.dataset()).await);
        let table = writer.dataset().table("current_weather");
        assert_eq!(warehouse.row_count(&table).await, Some(2));
    }

    #[tokio::test]
    async fn test_existing_dataset_is_not_an_error() {
        let warehouse = MemoryWarehouse::new();
        let writer = writer(warehouse.clone());
        writer.ensure_dataset().await.unwrap();
        writer.ensure_dataset().await.unwrap();
        assert!(warehouse.has_dataset(writer.dataset()).await);
    }

    #[tokio::test]
    async fn test_empty_frame_fails_and_keeps_old_rows() {
        let warehouse = MemoryWarehouse::new();
        let writer = writer(warehouse.clone());
        let frame = df!("name" => ["Rome"]).unwrap();
        writer.write(&frame, "forecasted_weather").await.unwrap();

        let result = writer.write(&DataFrame::empty(), "forecasted_weather").await;

        assert!(matches!(
            result,
            Err(WarehouseError::NothingToLoad(t)) if t.ends_with("forecasted_weather")
        ));
        assert_eq!(warehouse.jobs_run().await, 1);
        let table = writer.dataset().table("forecasted_weather");
        assert_eq!(warehouse.row_count(&table).await, Some(1));
    }

    #[tokio::test]
    async fn test_default_dataset_location() {
        let writer = writer(MemoryWarehouse::new());
        assert_eq!(writer.dataset_location, DEFAULT_DATASET_LOCATION);
    }

    /// Refuses dataset creation with a permission error and never loads.
    struct DeniedWarehouse {
        loads: AtomicUsize,
    }

    #[async_trait]
    impl Warehouse for DeniedWarehouse {
        async fn create_dataset(
            &self,
            dataset: &DatasetRef,
            _location: &str,
        ) -> Result<(), WarehouseError> {
            Err(WarehouseError::Api {
                url: format!("datasets/{dataset}"),
                status: reqwest::StatusCode::FORBIDDEN,
                message: "permission denied".to_string(),
            })
        }

        async fn load_table(
            &self,
            frame: &DataFrame,
            _table: &TableRef,
            _config: &LoadJobConfig,
        ) -> Result<LoadOutcome, WarehouseError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(LoadOutcome {
                job_id: None,
                rows_loaded: frame.height(),
            })
        }
    }

    #[tokio::test]
    async fn test_dataset_errors_other_than_exists_propagate() {
        let writer = TableWriter::builder()
            .warehouse(DeniedWarehouse {
                loads: AtomicUsize::new(0),
            })
            .project_id("p")
            .dataset_id("d")
            .dataset_location("EU")
            .build();
        let frame = df!("x" => [1i64]).unwrap();

        let result = writer.write(&frame, "t").await;

        assert!(matches!(result, Err(WarehouseError::Api { .. })));
        assert_eq!(writer.warehouse().loads.load(Ordering::SeqCst), 0);
    }

    struct RejectingLoads;

    #[async_trait]
    impl Warehouse for RejectingLoads {
        async fn create_dataset(
            &self,
            _dataset: &DatasetRef,
            _location: &str,
        ) -> Result<(), WarehouseError> {
            Ok(())
        }

        async fn load_table(
            &self,
            _frame: &DataFrame,
            _table: &TableRef,
            _config: &LoadJobConfig,
        ) -> Result<LoadOutcome, WarehouseError> {
            Err(WarehouseError::LoadJobFailed {
                job_id: "job_1".to_string(),
                reason: "invalid".to_string(),
                message: "Provided Schema does not match".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_load_failure_propagates() {
        let writer = TableWriter::builder()
            .warehouse(RejectingLoads)
            .project_id("p")
            .dataset_id("d")
            .build();
        let frame = df!("x" => [1i64]).unwrap();

        let result = writer.write(&frame, "t").await;

        assert!(matches!(result, Err(WarehouseError::LoadJobFailed { .. })));
    }
}
