use crate::config::ConfigError;
use crate::transform::error::TransformError;
use crate::trigger::TriggerError;
use crate::warehouse::error::WarehouseError;
use crate::weather::error::FetchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EtlError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    #[error(transparent)]
    Trigger(#[from] TriggerError),

    #[error("Failed to write table '{table}'")]
    TableWrite {
        table: String,
        #[source]
        source: WarehouseError,
    },
}
