pub mod memory;
pub mod result_cache;
pub mod state_store;

#[cfg(feature = "db")]
pub mod pg;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::config::{Config, StorageBackend};
use crate::domain::{GridSample, OptimizationRecord};
use crate::error::StorageError;

pub use memory::{AppendLog, InMemoryRepo};
pub use result_cache::ResultCache;
pub use state_store::{IngestReport, StateStore};

/// Durable append plus filtered-latest queries over grid samples.
///
/// `latest` orders by `observed_at`, ties going to the last inserted sample.
#[async_trait]
pub trait GridStateRepository: Send + Sync {
    async fn append(&self, sample: GridSample) -> Result<(), StorageError>;
    async fn latest(&self, region: Option<&str>) -> Result<Option<GridSample>, StorageError>;
    /// Newest first, at most `limit` entries.
    async fn history(&self, region: Option<&str>, limit: usize)
        -> Result<Vec<GridSample>, StorageError>;

    /// Connectivity probe for health checks.
    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Same contract as [`GridStateRepository`], keyed by `computed_at`.
#[async_trait]
pub trait OptimizationResultRepository: Send + Sync {
    async fn append(&self, record: OptimizationRecord) -> Result<(), StorageError>;
    async fn latest(&self, region: Option<&str>)
        -> Result<Option<OptimizationRecord>, StorageError>;
    async fn history(
        &self,
        region: Option<&str>,
        limit: usize,
    ) -> Result<Vec<OptimizationRecord>, StorageError>;
}

pub struct Repositories {
    pub states: Arc<dyn GridStateRepository>,
    pub results: Arc<dyn OptimizationResultRepository>,
}

impl Repositories {
    pub async fn new(cfg: &Config) -> Result<Self> {
        match cfg.db.backend {
            StorageBackend::Memory => {
                info!("using in-memory grid storage");
                Ok(Self::in_memory())
            }
            #[cfg(feature = "db")]
            StorageBackend::Postgres => {
                let repo = Arc::new(pg::PgRepo::connect(&cfg.db).await?);
                info!("using postgres grid storage");
                Ok(Self {
                    states: repo.clone(),
                    results: repo,
                })
            }
            #[cfg(not(feature = "db"))]
            StorageBackend::Postgres => {
                anyhow::bail!("postgres backend requested but the `db` feature is not enabled")
            }
        }
    }

    pub fn in_memory() -> Self {
        let repo = Arc::new(InMemoryRepo::default());
        Self {
            states: repo.clone(),
            results: repo,
        }
    }
}
