use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default nameplate capacity when an ingested sample does not carry one.
pub const DEFAULT_CAPACITY_MW: f64 = 1000.0;
/// Default efficiency percentage when an ingested sample does not carry one.
pub const DEFAULT_EFFICIENCY_PERCENT: f64 = 85.0;

/// One observed supply/demand state for a region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct GridSample {
    #[validate(length(min = 1, max = 50))]
    pub region: String,
    /// Demand in MW.
    pub demand: f64,
    /// Supply in MW.
    pub supply: f64,
    pub observed_at: DateTime<Utc>,
    /// Instantaneous load in MW, if the ingestion source reported one.
    #[serde(default)]
    pub current_load: f64,
    #[serde(default = "default_capacity")]
    pub capacity_mw: f64,
    #[serde(default = "default_efficiency")]
    #[validate(range(min = 0.0, max = 100.0))]
    pub efficiency_percent: f64,
}

fn default_capacity() -> f64 {
    DEFAULT_CAPACITY_MW
}

fn default_efficiency() -> f64 {
    DEFAULT_EFFICIENCY_PERCENT
}

impl GridSample {
    pub fn new(region: impl Into<String>, demand: f64, supply: f64, observed_at: DateTime<Utc>) -> Self {
        Self {
            region: region.into(),
            demand,
            supply,
            observed_at,
            current_load: 0.0,
            capacity_mw: DEFAULT_CAPACITY_MW,
            efficiency_percent: DEFAULT_EFFICIENCY_PERCENT,
        }
    }

    /// Signed surplus (positive) or deficit (negative) in MW.
    pub fn imbalance_mw(&self) -> f64 {
        self.supply - self.demand
    }

    /// Whether the demand/supply pair can be fed to the solver.
    pub fn is_finite(&self) -> bool {
        self.demand.is_finite() && self.supply.is_finite()
    }
}

/// Output of one solver run, as persisted in the result cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRecord {
    pub region: String,
    pub optimized_supply: f64,
    /// Always the input demand; only supply is adjusted.
    pub optimized_demand: f64,
    /// Squared imbalance `(optimized_supply - optimized_demand)^2` in MW².
    pub losses: f64,
    pub computed_at: DateTime<Utc>,
    #[serde(default)]
    pub iterations: u32,
    #[serde(default)]
    pub algorithm: String,
}

impl OptimizationRecord {
    /// Supply-side efficiency in percent, `None` when supply is not positive.
    pub fn efficiency_percent(&self) -> Option<f64> {
        if self.optimized_supply > 0.0 {
            Some((1.0 - self.losses / self.optimized_supply) * 100.0)
        } else {
            None
        }
    }

    /// Residual imbalance after optimization in MW.
    pub fn residual_mw(&self) -> f64 {
        self.optimized_supply - self.optimized_demand
    }
}
