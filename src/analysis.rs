//! Efficiency, load and loss summaries over stored history.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::access::AccessControl;
use crate::error::{GridError, GridResult};
use crate::repo::{ResultCache, StateStore};

/// Relative change below which a trend counts as stable.
const TREND_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AnalysisMetric {
    Efficiency,
    Load,
    Losses,
}

impl AnalysisMetric {
    /// Picks the metric a free-text request talks about, efficiency by default.
    pub fn detect(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("load") || lower.contains("demand") {
            AnalysisMetric::Load
        } else if lower.contains("loss") {
            AnalysisMetric::Losses
        } else {
            AnalysisMetric::Efficiency
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "metric", rename_all = "lowercase")]
pub enum MetricSummary {
    Efficiency {
        current_percent: Option<f64>,
        average_percent: Option<f64>,
        trend: Trend,
    },
    Load {
        current_mw: f64,
        average_mw: f64,
        peak_mw: f64,
        load_factor: Option<f64>,
    },
    Losses {
        latest: f64,
        average: f64,
        max: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridAnalysis {
    pub region: Option<String>,
    pub data_points: usize,
    #[serde(flatten)]
    pub summary: MetricSummary,
}

pub struct GridAnalyzer {
    access: AccessControl,
    states: StateStore,
    results: ResultCache,
    window: usize,
}

impl GridAnalyzer {
    pub fn new(access: AccessControl, states: StateStore, results: ResultCache, window: usize) -> Self {
        Self {
            access,
            states,
            results,
            window: window.max(1),
        }
    }

    pub async fn analyze(&self, region: Option<&str>, metric: AnalysisMetric) -> GridResult<GridAnalysis> {
        let region = region.map(|r| self.access.admit(r)).transpose()?;
        let (data_points, summary) = match metric {
            AnalysisMetric::Efficiency => {
                let history = self.results.history(region.as_deref(), self.window).await?;
                if history.is_empty() {
                    return Err(GridError::no_data(region.as_deref()));
                }
                let values: Vec<f64> = history.iter().filter_map(|r| r.efficiency_percent()).collect();
                let current = history[0].efficiency_percent();
                let average = mean(&values);
                (
                    history.len(),
                    MetricSummary::Efficiency {
                        current_percent: current,
                        average_percent: average,
                        trend: trend(current, average, true),
                    },
                )
            }
            AnalysisMetric::Load => {
                let history = self.states.history(region.as_deref(), self.window).await?;
                if history.is_empty() {
                    return Err(GridError::no_data(region.as_deref()));
                }
                let demands: Vec<f64> = history.iter().map(|s| s.demand).collect();
                let average = mean(&demands).unwrap_or(0.0);
                let peak = demands.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                (
                    history.len(),
                    MetricSummary::Load {
                        current_mw: demands[0],
                        average_mw: average,
                        peak_mw: peak,
                        load_factor: (peak > 0.0).then(|| average / peak),
                    },
                )
            }
            AnalysisMetric::Losses => {
                let history = self.results.history(region.as_deref(), self.window).await?;
                if history.is_empty() {
                    return Err(GridError::no_data(region.as_deref()));
                }
                let losses: Vec<f64> = history.iter().map(|r| r.losses).collect();
                (
                    history.len(),
                    MetricSummary::Losses {
                        latest: losses[0],
                        average: mean(&losses).unwrap_or(0.0),
                        max: losses.iter().copied().fold(0.0, f64::max),
                    },
                )
            }
        };
        Ok(GridAnalysis {
            region,
            data_points,
            summary,
        })
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn trend(current: Option<f64>, average: Option<f64>, higher_is_better: bool) -> Trend {
    let (Some(current), Some(average)) = (current, average) else {
        return Trend::Stable;
    };
    let scale = average.abs().max(1.0);
    let delta = (current - average) / scale;
    if delta.abs() < TREND_EPSILON {
        Trend::Stable
    } else if (delta > 0.0) == higher_is_better {
        Trend::Improving
    } else {
        Trend::Declining
    }
}
