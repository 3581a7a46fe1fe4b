use super::types::{derivatives, Minimizer, Minimum, SolverConfig, SolverError};

/// Newton iteration on finite-difference derivatives.
///
/// On a quadratic the first step lands on the minimum up to rounding, the
/// second confirms convergence.
pub struct NewtonMinimizer;

impl Minimizer for NewtonMinimizer {
    fn name(&self) -> &'static str {
        "newton"
    }

    fn minimize(
        &self,
        objective: &dyn Fn(f64) -> f64,
        x0: f64,
        config: &SolverConfig,
    ) -> Result<Minimum, SolverError> {
        let mut x = x0;
        for iteration in 1..=config.max_iterations {
            let (gradient, curvature) = derivatives(objective, x)?;
            if !(curvature > 0.0) {
                return Err(SolverError::Degenerate(x));
            }
            let step = gradient / curvature;
            x -= step;
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newton_converges_quickly_on_quadratic() {
        let f = |x: f64| (x - 1000.0).powi(2);
        let min = NewtonMinimizer
            .minimize(&f, 1100.0, &SolverConfig::default())
            .unwrap();
        assert!((min.x - 1000.0).abs() < 1e-6);
        assert!(min.iterations <= 3);
    }

    #[test]
    fn test_newton_rejects_concave_objective() {
        let f = |x: f64| -(x * x);
        let result = NewtonMinimizer.minimize(&f, 5.0, &SolverConfig::default());
        assert!(matches!(result, Err(SolverError::Degenerate(_))));
    }

    #[test]
    fn test_newton_reports_exhausted_iterations() {
        let f = |x: f64| (x - 10.0).powi(4);
        let config = SolverConfig {
            max_iterations: 2,
            ..SolverConfig::default()
        };
        let result = NewtonMinimizer.minimize(&f, 0.0, &config);
        assert!(matches!(
            result,
            Err(SolverError::NotConverged { iterations: 2, .. })
        ));
    }
}
