use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::cmp::Reverse;

use super::{GridStateRepository, OptimizationResultRepository};
use crate::domain::{GridSample, OptimizationRecord};
use crate::error::StorageError;

/// Anything stored in an [`AppendLog`].
pub trait Timestamped {
    fn region(&self) -> &str;
    fn timestamp(&self) -> DateTime<Utc>;
}

impl Timestamped for GridSample {
    fn region(&self) -> &str {
        &self.region
    }
    fn timestamp(&self) -> DateTime<Utc> {
        self.observed_at
    }
}

impl Timestamped for OptimizationRecord {
    fn region(&self) -> &str {
        &self.region
    }
    fn timestamp(&self) -> DateTime<Utc> {
        self.computed_at
    }
}

/// Append-only log kept in insertion order.
///
/// Each append takes the write lock once and pushes; there is no
/// read-modify-write, so concurrent writers never lose entries.
#[derive(Debug)]
pub struct AppendLog<T> {
    entries: RwLock<Vec<T>>,
}

impl<T> Default for AppendLog<T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl<T: Timestamped + Clone> AppendLog<T> {
    pub fn push(&self, item: T) {
        self.entries.write().push(item);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn latest(&self, region: Option<&str>) -> Option<T> {
        let entries = self.entries.read();
        // max_by_key keeps the last of equal maxima, i.e. the latest insert
        entries
            .iter()
            .filter(|e| region.map_or(true, |r| e.region() == r))
            .max_by_key(|e| e.timestamp())
            .cloned()
    }

    pub fn history(&self, region: Option<&str>, limit: usize) -> Vec<T> {
        let entries = self.entries.read();
        let mut matching: Vec<T> = entries
            .iter()
            .rev()
            .filter(|e| region.map_or(true, |r| e.region() == r))
            .cloned()
            .collect();
        matching.sort_by_key(|e| Reverse(e.timestamp()));
        matching.truncate(limit);
        matching
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRepo {
    pub samples: AppendLog<GridSample>,
    pub results: AppendLog<OptimizationRecord>,
}

#[async_trait]
impl GridStateRepository for InMemoryRepo {
    async fn append(&self, sample: GridSample) -> Result<(), StorageError> {
        self.samples.push(sample);
        Ok(())
    }

    async fn latest(&self, region: Option<&str>) -> Result<Option<GridSample>, StorageError> {
        Ok(self.samples.latest(region))
    }

    async fn history(
        &self,
        region: Option<&str>,
        limit: usize,
    ) -> Result<Vec<GridSample>, StorageError> {
        Ok(self.samples.history(region, limit))
    }
}

#[async_trait]
impl OptimizationResultRepository for InMemoryRepo {
    async fn append(&self, record: OptimizationRecord) -> Result<(), StorageError> {
        self.results.push(record);
        Ok(())
    }

    async fn latest(
        &self,
        region: Option<&str>,
    ) -> Result<Option<OptimizationRecord>, StorageError> {
        Ok(self.results.latest(region))
    }

    async fn history(
        &self,
        region: Option<&str>,
        limit: usize,
    ) -> Result<Vec<OptimizationRecord>, StorageError> {
        Ok(self.results.history(region, limit))
    }
}
