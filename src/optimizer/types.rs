use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// Relative finite-difference step, scaled by `max(1, |x|, sqrt(|f(x)|))`.
pub(crate) const FD_REL_STEP: f64 = 1e-3;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    #[error("non-finite input or objective value at x = {0}")]
    NonFinite(f64),
    #[error("objective curvature is not positive at x = {0}")]
    Degenerate(f64),
    #[error("no convergence after {iterations} iterations (last x = {last})")]
    NotConverged { iterations: u32, last: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Algorithm {
    Newton,
    GradientDescent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Step size below which the minimizer reports convergence.
    pub tolerance: f64,
    pub max_iterations: u32,
    pub algorithm: Algorithm,
    /// Only used by gradient descent.
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
}

fn default_learning_rate() -> f64 {
    0.25
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 100,
            algorithm: Algorithm::Newton,
            learning_rate: default_learning_rate(),
        }
    }
}

/// Point returned by a [`Minimizer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Minimum {
    pub x: f64,
    pub iterations: u32,
}

/// Unconstrained scalar minimizer seeded at `x0`.
pub trait Minimizer: Send + Sync {
    fn name(&self) -> &'static str;

    fn minimize(
        &self,
        objective: &dyn Fn(f64) -> f64,
        x0: f64,
        config: &SolverConfig,
    ) -> Result<Minimum, SolverError>;
}

/// Central differences for the first and second derivative at `x`.
///
/// The step grows with the objective value as well as with `x`, so the
/// second difference stays above rounding noise when `x` is small and the
/// objective is large.
pub(crate) fn derivatives(objective: &dyn Fn(f64) -> f64, x: f64) -> Result<(f64, f64), SolverError> {
    let mid = objective(x);
    if !mid.is_finite() {
        return Err(SolverError::NonFinite(x));
    }
    let h = FD_REL_STEP * x.abs().max(mid.abs().sqrt()).max(1.0);
    let (lo, hi) = (objective(x - h), objective(x + h));
    if !(lo.is_finite() && hi.is_finite()) {
        return Err(SolverError::NonFinite(x));
    }
    let gradient = (hi - lo) / (2.0 * h);
    let curvature = (hi - 2.0 * mid + lo) / (h * h);
    Ok((gradient, curvature))
}
