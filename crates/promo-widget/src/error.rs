use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error(transparent)]
    Client(#[from] promo_client::ClientError),

    #[error(transparent)]
    Config(#[from] promo_core::ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to serialize products for cache key {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("refresh scheduler error: {0}")]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),
}
