//! Newton-Raphson iteration on the NPV function

use super::config::XirrConfig;
use super::discount::{normalized_residual, npv_and_derivative, npv_at_rate};
use super::engine::{SolveMethod, Solution};
use crate::cashflow::CashFlowSeries;
use crate::error::XirrError;

/// Derivative magnitude (per unit of gross flow) treated as flat
const MIN_DERIVATIVE: f64 = 1e-12;

/// Why a Newton run stopped without a root
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum NewtonFailure {
    /// Derivative too close to zero to take a step
    FlatDerivative { rate: f64, iterations: usize, residual: f64 },
    /// Next iterate has `1 + rate <= 0`
    LeftDomain { rate: f64 },
    /// NPV or its derivative overflowed
    NonFinite { rate: f64, iterations: usize },
    /// Step fell below the step tolerance before the NPV tolerance was met
    Stalled { rate: f64, iterations: usize, residual: f64 },
    /// Iteration cap reached
    Exhausted { rate: f64, iterations: usize, residual: f64 },
}

impl NewtonFailure {
    /// Error reported when no fallback is attempted
    pub(crate) fn into_error(self) -> XirrError {
        match self {
            NewtonFailure::LeftDomain { rate } => XirrError::Domain { rate },
            NewtonFailure::NonFinite { rate, iterations } => XirrError::Convergence {
                iterations,
                rate,
                residual: f64::INFINITY,
            },
            NewtonFailure::FlatDerivative { rate, iterations, residual }
            | NewtonFailure::Stalled { rate, iterations, residual }
            | NewtonFailure::Exhausted { rate, iterations, residual } => XirrError::Convergence {
                iterations,
                rate,
                residual,
            },
        }
    }
}

/// Run Newton-Raphson from `guess`, which must satisfy `guess > -1`
pub(crate) fn solve(
    series: &CashFlowSeries,
    guess: f64,
    config: &XirrConfig,
) -> Result<Solution, NewtonFailure> {
    let gross = series.gross_flow();
    let mut rate = guess;

    for iteration in 0..config.max_iterations {
        let (npv, dnpv) = npv_and_derivative(series, rate);
        if !npv.is_finite() || !dnpv.is_finite() {
            return Err(NewtonFailure::NonFinite { rate, iterations: iteration });
        }

        let residual = normalized_residual(series, npv);
        if residual < config.npv_tolerance {
            return Ok(Solution::new(rate, npv, iteration, SolveMethod::NewtonRaphson));
        }

        if dnpv.abs() < MIN_DERIVATIVE * gross {
            return Err(NewtonFailure::FlatDerivative { rate, iterations: iteration, residual });
        }

        let step = npv / dnpv;
        let next = rate - step;
        if !next.is_finite() || 1.0 + next <= 0.0 {
            return Err(NewtonFailure::LeftDomain { rate: next });
        }

        if step.abs() < config.step_tolerance {
            let next_npv = npv_at_rate(series, next);
            let next_residual = normalized_residual(series, next_npv);
            if next_residual < config.npv_tolerance {
                return Ok(Solution::new(next, next_npv, iteration + 1, SolveMethod::NewtonRaphson));
            }
            return Err(NewtonFailure::Stalled {
                rate: next,
                iterations: iteration + 1,
                residual: next_residual,
            });
        }

        rate = next;
    }

    // The last update has not been checked yet
    let npv = npv_at_rate(series, rate);
    let residual = normalized_residual(series, npv);
    if residual < config.npv_tolerance {
        Ok(Solution::new(rate, npv, config.max_iterations, SolveMethod::NewtonRaphson))
    } else {
        Err(NewtonFailure::Exhausted {
            rate,
            iterations: config.max_iterations,
            residual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_simple_newton() {
        // Investment of $1000, returns $1100 after 1 year
        let series = CashFlowSeries::new(vec![-1000.0, 1100.0], vec![0.0, 365.0]).unwrap();
        let solution = solve(&series, 0.1, &XirrConfig::default()).unwrap();
        // 0.1 is already the root
        assert_abs_diff_eq!(solution.rate, 0.1, epsilon = 1e-12);
        assert_eq!(solution.iterations, 0);
        assert_eq!(solution.method, SolveMethod::NewtonRaphson);
    }

    #[test]
    fn test_converges_from_guess() {
        let series = CashFlowSeries::new(vec![-1000.0, 1100.0], vec![0.0, 730.0]).unwrap();
        let solution = solve(&series, 0.1, &XirrConfig::default()).unwrap();
        assert_abs_diff_eq!(solution.rate, 1.1_f64.sqrt() - 1.0, epsilon = 1e-9);
        assert!(solution.iterations > 0);
    }

    #[test]
    fn test_leaves_domain() {
        // Root at -90%: the first step from 10% overshoots below -100%
        let series = CashFlowSeries::new(vec![-1000.0, 100.0], vec![0.0, 365.0]).unwrap();
        let failure = solve(&series, 0.1, &XirrConfig::default()).unwrap_err();
        match failure {
            NewtonFailure::LeftDomain { rate } => assert!(rate <= -1.0),
            other => panic!("expected LeftDomain, got {:?}", other),
        }
        assert!(matches!(failure.into_error(), XirrError::Domain { .. }));
    }

    #[test]
    fn test_flat_derivative() {
        // NPV peaks at 20%, roots at 0% and 50%
        let series = CashFlowSeries::new(vec![-1.0, 2.5, -1.5], vec![0.0, 365.0, 730.0]).unwrap();
        let failure = solve(&series, 0.2, &XirrConfig::default()).unwrap_err();
        assert!(matches!(failure, NewtonFailure::FlatDerivative { iterations: 0, .. }));
        assert!(matches!(failure.into_error(), XirrError::Convergence { .. }));
    }

    #[test]
    fn test_non_finite_npv() {
        // 200 years at -99%: (0.01)^-200 overflows
        let series = CashFlowSeries::new(vec![-1.0, 2.0], vec![0.0, 73_000.0]).unwrap();
        let failure = solve(&series, -0.99, &XirrConfig::default()).unwrap_err();
        assert!(matches!(failure, NewtonFailure::NonFinite { iterations: 0, .. }));
        match failure.into_error() {
            XirrError::Convergence { residual, .. } => assert!(residual.is_infinite()),
            other => panic!("expected Convergence, got {:?}", other),
        }
    }

    #[test]
    fn test_exhausted() {
        let series = CashFlowSeries::new(vec![-1000.0, 1100.0], vec![0.0, 730.0]).unwrap();
        let config = XirrConfig { max_iterations: 1, ..XirrConfig::default() };
        let failure = solve(&series, 0.1, &config).unwrap_err();
        assert!(matches!(failure, NewtonFailure::Exhausted { iterations: 1, .. }));
    }
}
