//! XIRR entry points
//!
//! Newton-Raphson runs first; if it fails and the fallback is enabled, a sign
//! change is bracketed around the starting guess and bisected.

use rayon::prelude::*;
use serde::Serialize;

use super::config::XirrConfig;
use super::discount::check_domain;
use super::{bracket, newton};
use crate::cashflow::{CashFlowSeries, TransactionDate};
use crate::error::{XirrError, XirrResult};

/// Root-finding method that produced a solution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolveMethod {
    NewtonRaphson,
    Bisection,
}

/// A solved rate with diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Solution {
    /// Annual rate as a decimal (0.08 = 8%)
    pub rate: f64,
    /// NPV at `rate`
    pub npv: f64,
    /// Iterations taken by the method that found the root
    pub iterations: usize,
    pub method: SolveMethod,
}

impl Solution {
    pub(crate) fn new(rate: f64, npv: f64, iterations: usize, method: SolveMethod) -> Self {
        Self { rate, npv, iterations, method }
    }

    /// Rate expressed in percent (8.0 = 8%)
    pub fn rate_percent(&self) -> f64 {
        self.rate * 100.0
    }
}

/// Calculate the XIRR of amounts on the given dates with the default configuration
///
/// # Returns
/// * Annual rate as a decimal (e.g., 0.05 for 5%)
///
/// # Example
/// ```
/// use chrono::NaiveDate;
///
/// let dates = [
///     NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
/// ];
/// let rate = xirr::xirr(&[-1000.0, 1100.0], &dates).unwrap();
/// assert!((rate - 0.10).abs() < 1e-9);
/// ```
pub fn xirr<D: TransactionDate>(amounts: &[f64], dates: &[D]) -> XirrResult<f64> {
    xirr_with_config(amounts, dates, &XirrConfig::default()).map(|solution| solution.rate)
}

/// Calculate the XIRR of amounts on the given dates
pub fn xirr_with_config<D: TransactionDate>(
    amounts: &[f64],
    dates: &[D],
    config: &XirrConfig,
) -> XirrResult<Solution> {
    let series = CashFlowSeries::from_dates(amounts, dates)?;
    solve(&series, config)
}

/// Solve a validated series for the rate that zeroes its NPV
pub fn solve(series: &CashFlowSeries, config: &XirrConfig) -> XirrResult<Solution> {
    config.validate()?;

    let guess = config.initial_guess.resolve(series);
    check_domain(guess)?;

    match newton::solve(series, guess, config) {
        Ok(solution) => Ok(solution),
        Err(_) if config.fallback => {
            let (low, high) =
                bracket::find_bracket(series, guess, config.bracket_lower, config.bracket_upper)
                    .ok_or(XirrError::NoRootFound {
                        lower: config.bracket_lower,
                        upper: config.bracket_upper,
                    })?;
            bracket::bisect(series, low, high, config)
        }
        Err(failure) => Err(failure.into_error()),
    }
}

/// Solve independent series in parallel; results keep input order
pub fn solve_batch(series: &[CashFlowSeries], config: &XirrConfig) -> Vec<XirrResult<Solution>> {
    series.par_iter().map(|s| solve(s, config)).collect()
}
