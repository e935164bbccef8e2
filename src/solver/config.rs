//! Solver configuration

use serde::{Deserialize, Serialize};

use crate::cashflow::CashFlowSeries;
use crate::error::{XirrError, XirrResult};

/// Default starting rate for Newton-Raphson (10%)
pub const DEFAULT_INITIAL_GUESS: f64 = 0.1;

/// Default NPV tolerance, relative to the gross cash flow
pub const DEFAULT_NPV_TOLERANCE: f64 = 1e-10;

/// Default Newton step size below which the iteration is considered stalled
pub const DEFAULT_STEP_TOLERANCE: f64 = 1e-12;

/// Default iteration cap, applied separately to Newton and bisection
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Default bracket search range for the bisection fallback
pub const DEFAULT_BRACKET_LOWER: f64 = -0.99;
pub const DEFAULT_BRACKET_UPPER: f64 = 10.0;

/// How the first Newton iterate is chosen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InitialGuess {
    /// Start from a fixed annual rate
    Fixed(f64),
    /// Start from gross inflow over gross outflow spread across the series' span,
    /// or 0 when that estimate exceeds 100% in magnitude
    ReturnOverHorizon,
}

impl InitialGuess {
    /// Resolve the starting rate for a series
    pub fn resolve(&self, series: &CashFlowSeries) -> f64 {
        match *self {
            InitialGuess::Fixed(rate) => rate,
            InitialGuess::ReturnOverHorizon => {
                let years = series.span_years();
                let estimate = series.gross_inflow() / series.gross_outflow() / years;
                if estimate.is_finite() && estimate.abs() <= 1.0 {
                    estimate
                } else {
                    0.0
                }
            }
        }
    }
}

impl Default for InitialGuess {
    fn default() -> Self {
        InitialGuess::Fixed(DEFAULT_INITIAL_GUESS)
    }
}

/// Configuration for an XIRR solve
///
/// A rate `r` is accepted when `|npv(r)| / Σ|amounts| < npv_tolerance`. The same
/// test is used by Newton-Raphson and by the bisection fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct XirrConfig {
    /// Starting point for Newton-Raphson
    pub initial_guess: InitialGuess,

    /// NPV residual tolerance (ε), relative to the gross cash flow
    pub npv_tolerance: f64,

    /// Newton step tolerance (δ)
    /// A step smaller than this that has not met `npv_tolerance` is a stall
    pub step_tolerance: f64,

    /// Iteration cap for each method
    pub max_iterations: usize,

    /// Lowest rate considered when searching for a bracket
    pub bracket_lower: f64,

    /// Highest rate considered when searching for a bracket
    pub bracket_upper: f64,

    /// Fall back to bracketing + bisection when Newton fails.
    /// If false, Newton failures are returned directly.
    pub fallback: bool,
}

impl Default for XirrConfig {
    fn default() -> Self {
        Self {
            initial_guess: InitialGuess::default(),
            npv_tolerance: DEFAULT_NPV_TOLERANCE,
            step_tolerance: DEFAULT_STEP_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            bracket_lower: DEFAULT_BRACKET_LOWER,
            bracket_upper: DEFAULT_BRACKET_UPPER,
            fallback: true,
        }
    }
}

impl XirrConfig {
    /// Default configuration starting from a different fixed guess
    pub fn with_initial_guess(rate: f64) -> Self {
        Self {
            initial_guess: InitialGuess::Fixed(rate),
            ..Self::default()
        }
    }

    /// Check that tolerances, cap, guess and bracket are usable
    pub fn validate(&self) -> XirrResult<()> {
        if !(self.npv_tolerance.is_finite() && self.npv_tolerance > 0.0) {
            return Err(XirrError::invalid_input(format!(
                "npv_tolerance must be positive and finite, got {}",
                self.npv_tolerance
            )));
        }
        if !(self.step_tolerance.is_finite() && self.step_tolerance > 0.0) {
            return Err(XirrError::invalid_input(format!(
                "step_tolerance must be positive and finite, got {}",
                self.step_tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(XirrError::invalid_input("max_iterations must be at least 1"));
        }
        if let InitialGuess::Fixed(rate) = self.initial_guess {
            if rate.is_nan() {
                return Err(XirrError::invalid_input("initial guess is NaN"));
            }
            if rate <= -1.0 || !rate.is_finite() {
                return Err(XirrError::Domain { rate });
            }
        }
        if !(self.bracket_lower.is_finite() && self.bracket_upper.is_finite())
            || self.bracket_lower <= -1.0
            || self.bracket_lower >= self.bracket_upper
        {
            return Err(XirrError::invalid_input(format!(
                "bracket [{}, {}] must be finite, above -1 and non-empty",
                self.bracket_lower, self.bracket_upper
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_defaults() {
        let config = XirrConfig::default();
        assert_eq!(config.initial_guess, InitialGuess::Fixed(0.1));
        assert_eq!(config.max_iterations, 100);
        assert!(config.fallback);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_configs() {
        let config = XirrConfig { npv_tolerance: 0.0, ..XirrConfig::default() };
        assert!(matches!(config.validate(), Err(XirrError::InvalidInput { .. })));

        let config = XirrConfig { max_iterations: 0, ..XirrConfig::default() };
        assert!(matches!(config.validate(), Err(XirrError::InvalidInput { .. })));

        let config = XirrConfig { bracket_lower: 1.0, bracket_upper: 0.5, ..XirrConfig::default() };
        assert!(matches!(config.validate(), Err(XirrError::InvalidInput { .. })));

        let config = XirrConfig { bracket_lower: -1.0, ..XirrConfig::default() };
        assert!(matches!(config.validate(), Err(XirrError::InvalidInput { .. })));

        let config = XirrConfig::with_initial_guess(-1.0);
        assert!(matches!(config.validate(), Err(XirrError::Domain { .. })));
    }

    #[test]
    fn test_return_over_horizon_guess() {
        // 1000 out, 1200 back over two years: 1.2 / 2 = 0.6
        let series = CashFlowSeries::new(vec![-1000.0, 1200.0], vec![0.0, 730.0]).unwrap();
        assert_abs_diff_eq!(InitialGuess::ReturnOverHorizon.resolve(&series), 0.6, epsilon = 1e-12);

        // Estimate above 100% falls back to zero
        let series = CashFlowSeries::new(vec![-100.0, 500.0], vec![0.0, 365.0]).unwrap();
        assert_eq!(InitialGuess::ReturnOverHorizon.resolve(&series), 0.0);
    }

    #[test]
    fn test_json_round_trip_with_defaults() {
        let config: XirrConfig = serde_json::from_str(r#"{"max_iterations": 50}"#).unwrap();
        assert_eq!(config.max_iterations, 50);
        assert_eq!(config.npv_tolerance, DEFAULT_NPV_TOLERANCE);

        let config: XirrConfig =
            serde_json::from_str(r#"{"initial_guess": "ReturnOverHorizon"}"#).unwrap();
        assert_eq!(config.initial_guess, InitialGuess::ReturnOverHorizon);
    }
}
