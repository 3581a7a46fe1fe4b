use chrono::Utc;
use std::time::Instant;
use tracing::{info, warn};

use crate::access::AccessControl;
use crate::domain::OptimizationRecord;
use crate::error::GridResult;
use crate::optimizer::GridSolver;
use crate::repo::{ResultCache, StateStore};

/// Fetch latest state, solve, persist, return.
///
/// Concurrent calls for the same region are independent: each one reads,
/// solves and stores its own record. There is no coalescing.
pub struct OptimizationEngine {
    access: AccessControl,
    states: StateStore,
    results: ResultCache,
    solver: GridSolver,
}

impl OptimizationEngine {
    pub fn new(
        access: AccessControl,
        states: StateStore,
        results: ResultCache,
        solver: GridSolver,
    ) -> Self {
        Self {
            access,
            states,
            results,
            solver,
        }
    }

    pub async fn optimize(&self, region: Option<&str>) -> GridResult<OptimizationRecord> {
        let region = region.map(|r| self.access.admit(r)).transpose()?;
        let started = Instant::now();

        let sample = match self.states.latest(region.as_deref()).await {
            Ok(sample) => sample,
            Err(e) => {
                warn!(region = region.as_deref().unwrap_or("*"), error = %e, "optimization aborted");
                return Err(e);
            }
        };

        let solution = self.solver.solve(sample.demand, sample.supply)?;
        let record = OptimizationRecord {
            region: sample.region.clone(),
            optimized_supply: solution.optimized_supply,
            optimized_demand: sample.demand,
            losses: solution.losses,
            computed_at: Utc::now(),
            iterations: solution.iterations,
            algorithm: self.solver.algorithm().to_string(),
        };
        self.results.store(record.clone()).await?;

        info!(
            region = %record.region,
            demand = sample.demand,
            supply = sample.supply,
            optimized_supply = record.optimized_supply,
            losses = record.losses,
            iterations = record.iterations,
            elapsed_us = started.elapsed().as_micros() as u64,
            "grid optimization completed"
        );
        Ok(record)
    }

    pub async fn latest_result(&self, region: Option<&str>) -> GridResult<OptimizationRecord> {
        let region = region.map(|r| self.access.admit(r)).transpose()?;
        self.results.latest(region.as_deref()).await
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn states(&self) -> &StateStore {
        &self.states
    }

    pub fn results(&self) -> &ResultCache {
        &self.results
    }
}
