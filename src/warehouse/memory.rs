use crate::warehouse::error::WarehouseError;
use crate::warehouse::{
    CreateDisposition, DatasetRef, LoadJobConfig, LoadOutcome, TableRef, Warehouse,
    WriteDisposition,
};
use async_trait::async_trait;
use log::debug;
use polars::prelude::{concat_lf_diagonal, DataFrame, IntoLazy, UnionArgs};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct State {
    datasets: HashSet<DatasetRef>,
    tables: HashMap<TableRef, DataFrame>,
    jobs: usize,
}

/// A warehouse that keeps everything in process.
///
/// Dispositions behave as they do in BigQuery: loads into a missing dataset
/// fail, truncate replaces, append stacks. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryWarehouse {
    state: Arc<RwLock<State>>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn has_dataset(&self, dataset: &DatasetRef) -> bool {
        self.state.read().await.datasets.contains(dataset)
    }

    pub async fn table(&self, table: &TableRef) -> Option<DataFrame> {
        self.state.read().await.tables.get(table).cloned()
    }

    pub async fn row_count(&self, table: &TableRef) -> Option<usize> {
        self.state.read().await.tables.get(table).map(|t| t.height())
    }

    /// Number of load jobs that completed.
    pub async fn jobs_run(&self) -> usize {
        self.state.read().await.jobs
    }
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    async fn create_dataset(
        &self,
        dataset: &DatasetRef,
        _location: &str,
    ) -> Result<(), WarehouseError> {
        let mut state = self.state.write().await;
        if !state.datasets.insert(dataset.clone()) {
            return Err(WarehouseError::AlreadyExists(dataset.to_string()));
        }
        Ok(())
    }

    async fn load_table(
        &self,
        frame: &DataFrame,
        table: &TableRef,
        config: &LoadJobConfig,
    ) -> Result<LoadOutcome, WarehouseError> {
        let mut state = self.state.write().await;

        if !state.datasets.contains(&table.dataset) {
            return Err(WarehouseError::DatasetNotFound(table.dataset.to_string()));
        }

        let existing = state.tables.get(table);
        if existing.is_none() && config.create_disposition == CreateDisposition::CreateNever {
            return Err(WarehouseError::TableNotFound(table.to_string()));
        }

        let stored = match (config.write_disposition, existing) {
            (WriteDisposition::WriteAppend, Some(existing)) => {
                let args = UnionArgs {
                    to_supertypes: true,
                    ..Default::default()
                };
                concat_lf_diagonal([existing.clone().lazy(), frame.clone().lazy()], args)?
                    .collect()?
            }
            (WriteDisposition::WriteEmpty, Some(existing)) if existing.height() > 0 => {
                return Err(WarehouseError::TableNotEmpty(table.to_string()));
            }
            _ => frame.clone(),
        };

        debug!("Stored {} rows in {}", stored.height(), table);
        state.tables.insert(table.clone(), stored);
        state.jobs += 1;

        Ok(LoadOutcome {
            job_id: Some(format!("memory-{}", state.jobs)),
            rows_loaded: frame.height(),
        })
    }
}
