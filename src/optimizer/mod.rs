pub mod gradient;
pub mod newton;
pub mod types;

pub use gradient::*;
pub use newton::*;
pub use types::*;

use serde::Serialize;

/// Result of balancing one demand/supply pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Solution {
    pub optimized_supply: f64,
    /// `(optimized_supply - demand)^2`, recomputed from the returned supply.
    pub losses: f64,
    pub iterations: u32,
}

/// Minimizes the squared imbalance `(x - demand)^2`, seeded at the current
/// supply. The demand itself is never adjusted.
pub struct GridSolver {
    pub strategy: Box<dyn Minimizer>,
    pub config: SolverConfig,
}

impl GridSolver {
    pub fn new(config: SolverConfig) -> Self {
        let strategy: Box<dyn Minimizer> = match config.algorithm {
            Algorithm::Newton => Box::new(NewtonMinimizer),
            Algorithm::GradientDescent => Box::new(GradientDescentMinimizer),
        };
        Self { strategy, config }
    }

    pub fn algorithm(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn solve(&self, demand: f64, supply: f64) -> Result<Solution, SolverError> {
        if !demand.is_finite() {
            return Err(SolverError::NonFinite(demand));
        }
        if !supply.is_finite() {
            return Err(SolverError::NonFinite(supply));
        }
        let objective = move |x: f64| (x - demand).powi(2);
        let minimum = self.strategy.minimize(&objective, supply, &self.config)?;
        Ok(Solution {
            optimized_supply: minimum.x,
            losses: (minimum.x - demand).powi(2),
            iterations: minimum.iterations,
        })
    }
}

impl Default for GridSolver {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn solver(algorithm: Algorithm) -> GridSolver {
        GridSolver::new(SolverConfig {
            algorithm,
            ..SolverConfig::default()
        })
    }

    #[rstest]
    #[case(1000.0, 1100.0)]
    #[case(0.0, 0.0)]
    #[case(-50.0, 20.0)]
    #[case(800.0, 800.0)]
    #[case(1e-9, -1e-9)]
    #[case(5e5, 0.0)]
    #[case(-1e6, 0.0)]
    #[case(9e5, -0.5)]
    fn test_solve_reaches_demand(
        #[case] demand: f64,
        #[case] supply: f64,
        #[values(Algorithm::Newton, Algorithm::GradientDescent)] algorithm: Algorithm,
    ) {
        let solution = solver(algorithm).solve(demand, supply).unwrap();
        assert!((solution.optimized_supply - demand).abs() <= 1e-6);
        assert_eq!(solution.losses, (solution.optimized_supply - demand).powi(2));
        assert!(solution.losses >= 0.0);
    }

    #[test]
    fn test_solve_rejects_non_finite_input() {
        let solver = GridSolver::default();
        assert!(matches!(
            solver.solve(f64::NAN, 1.0),
            Err(SolverError::NonFinite(_))
        ));
        assert!(matches!(
            solver.solve(1.0, f64::INFINITY),
            Err(SolverError::NonFinite(_))
        ));
    }

    #[test]
    fn test_descent_out_of_range_is_an_error() {
        let result = solver(Algorithm::GradientDescent).solve(5e153, 0.0);
        assert!(matches!(result, Err(SolverError::NotConverged { .. })));
    }

    #[test]
    fn test_strategy_follows_config() {
        assert_eq!(solver(Algorithm::Newton).algorithm(), "newton");
        assert_eq!(
            solver(Algorithm::GradientDescent).algorithm(),
            "gradient-descent"
        );
    }

    proptest! {
        #[test]
        fn prop_newton_within_tolerance(demand in -1e6f64..1e6, supply in -1e6f64..1e6) {
            let solution = solver(Algorithm::Newton).solve(demand, supply).unwrap();
            prop_assert!((solution.optimized_supply - demand).abs() <= 1e-6);
            let expected = (solution.optimized_supply - demand).powi(2);
            prop_assert!((solution.losses - expected).abs() <= 1e-12);
        }

        #[test]
        fn prop_near_zero_supply_reaches_demand(
            demand in -1e6f64..1e6,
            supply in -1.0f64..1.0,
            algorithm in prop_oneof![Just(Algorithm::Newton), Just(Algorithm::GradientDescent)],
        ) {
            let solution = solver(algorithm).solve(demand, supply).unwrap();
            prop_assert!((solution.optimized_supply - demand).abs() <= 1e-6);
        }

        #[test]
        fn prop_descent_within_tolerance(demand in -1e6f64..1e6, supply in -1e6f64..1e6) {
            let solution = solver(Algorithm::GradientDescent).solve(demand, supply).unwrap();
            prop_assert!((solution.optimized_supply - demand).abs() <= 1e-6);
        }
    }
}
