use std::sync::Arc;
use tracing::debug;

use super::OptimizationResultRepository;
use crate::access::AccessControl;
use crate::domain::OptimizationRecord;
use crate::error::{GridError, GridResult};

/// Append-only record of solver outputs. "Current" is always derived from
/// `computed_at`, never from a mutable pointer.
#[derive(Clone)]
pub struct ResultCache {
    backend: Arc<dyn OptimizationResultRepository>,
    access: AccessControl,
}

impl ResultCache {
    pub fn new(backend: Arc<dyn OptimizationResultRepository>, access: AccessControl) -> Self {
        Self { backend, access }
    }

    pub async fn store(&self, record: OptimizationRecord) -> GridResult<()> {
        debug!(region = %record.region, losses = record.losses, "storing optimization record");
        self.backend.append(record).await?;
        Ok(())
    }

    /// Most recent record for `region`, or across all regions when `None`.
    /// Regions outside the allow-list fail with `InvalidRegion`.
    pub async fn latest(&self, region: Option<&str>) -> GridResult<OptimizationRecord> {
        let region = region.map(|r| self.access.admit(r)).transpose()?;
        self.backend
            .latest(region.as_deref())
            .await?
            .ok_or_else(|| GridError::no_data(region.as_deref()))
    }

    pub async fn history(
        &self,
        region: Option<&str>,
        limit: usize,
    ) -> GridResult<Vec<OptimizationRecord>> {
        let region = region.map(|r| self.access.admit(r)).transpose()?;
        Ok(self.backend.history(region.as_deref(), limit).await?)
    }
}
