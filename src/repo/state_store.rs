use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};
use validator::Validate;

use super::GridStateRepository;
use crate::access::AccessControl;
use crate::domain::GridSample;
use crate::error::{GridError, GridResult};

/// Outcome of a batch ingestion.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub accepted: usize,
    pub rejected: usize,
}

/// Append-only time series of grid samples, gated by access control.
#[derive(Clone)]
pub struct StateStore {
    backend: Arc<dyn GridStateRepository>,
    access: AccessControl,
}

impl StateStore {
    pub fn new(backend: Arc<dyn GridStateRepository>, access: AccessControl) -> Self {
        Self { backend, access }
    }

    /// Appends a sample under its normalized region name.
    pub async fn record(&self, mut sample: GridSample) -> GridResult<()> {
        if sample.region.trim().is_empty() {
            return Err(GridError::MalformedSample("missing region".to_string()));
        }
        if !sample.is_finite() {
            return Err(GridError::MalformedSample(format!(
                "non-finite demand/supply for region {}",
                crate::access::sanitize(&sample.region)
            )));
        }
        sample.region = self.access.admit(&sample.region)?;
        sample
            .validate()
            .map_err(|e| GridError::MalformedSample(e.to_string()))?;

        debug!(region = %sample.region, demand = sample.demand, supply = sample.supply, "recording grid sample");
        self.backend.append(sample).await?;
        Ok(())
    }

    /// Records each sample independently; storage failures abort the batch.
    pub async fn record_batch<I>(&self, samples: I) -> GridResult<IngestReport>
    where
        I: IntoIterator<Item = GridSample>,
    {
        let mut report = IngestReport::default();
        for sample in samples {
            match self.record(sample).await {
                Ok(()) => report.accepted += 1,
                Err(GridError::Storage(e)) => return Err(GridError::Storage(e)),
                Err(e) => {
                    warn!(error = %e, "skipping sample");
                    report.rejected += 1;
                }
            }
        }
        Ok(report)
    }

    /// Most recent sample for `region`, or across all regions when `None`.
    /// Regions outside the allow-list fail with `InvalidRegion`.
    pub async fn latest(&self, region: Option<&str>) -> GridResult<GridSample> {
        let region = region.map(|r| self.access.admit(r)).transpose()?;
        self.backend
            .latest(region.as_deref())
            .await?
            .ok_or_else(|| GridError::no_data(region.as_deref()))
    }

    pub async fn history(&self, region: Option<&str>, limit: usize) -> GridResult<Vec<GridSample>> {
        let region = region.map(|r| self.access.admit(r)).transpose()?;
        Ok(self.backend.history(region.as_deref(), limit).await?)
    }

    pub async fn ping(&self) -> GridResult<()> {
        Ok(self.backend.ping().await?)
    }
}
