use super::types::{derivatives, Minimizer, Minimum, SolverConfig, SolverError};

/// Fixed-step gradient descent.
pub struct GradientDescentMinimizer;

impl Minimizer for GradientDescentMinimizer {
    fn name(&self) -> &'static str {
        "gradient-descent"
    }

    fn minimize(
        &self,
        objective: &dyn Fn(f64) -> f64,
        x0: f64,
        config: &SolverConfig,
    ) -> Result<Minimum, SolverError> {
        let mut x = x0;
        for iteration in 1..=config.max_iterations {
            let (gradient, _) = derivatives(objective, x)?;
            let step = config.learning_rate * gradient;
            x -= step;
            if !x.is_finite() {
                return Err(SolverError::NonFinite(x));
            }
            if step.abs() <= config.tolerance {
                return Ok(Minimum { x, iterations: iteration });
            }
        }
        Err(SolverError::NotConverged {
            iterations: config.max_iterations,
            last: x,
        })
    }
}
