//! Validated cash flow series

use super::dates::{elapsed_days, from_timestamp_millis, parse_date, TransactionDate};
use crate::error::{XirrError, XirrResult};
use crate::solver::DAYS_PER_YEAR;

/// Signed cash amounts paired index-for-index with elapsed days from an origin
///
/// Construction validates the shape of the series, so every `CashFlowSeries`
/// has at least two finite flows of both signs spread over more than one date.
/// Order is preserved and duplicate dates are kept as separate flows.
#[derive(Debug, Clone, PartialEq)]
pub struct CashFlowSeries {
    amounts: Vec<f64>,
    days: Vec<f64>,
}

impl CashFlowSeries {
    /// Build a series from amounts and their signed day offsets
    pub fn new(amounts: Vec<f64>, days: Vec<f64>) -> XirrResult<Self> {
        check_lengths(amounts.len(), days.len())?;

        if let Some(i) = amounts.iter().position(|a| !a.is_finite()) {
            return Err(XirrError::invalid_input(format!(
                "amount at index {} is not finite ({})",
                i, amounts[i]
            )));
        }
        if let Some(i) = days.iter().position(|d| !d.is_finite()) {
            return Err(XirrError::invalid_input(format!(
                "day offset at index {} is not finite ({})",
                i, days[i]
            )));
        }

        let has_positive = amounts.iter().any(|&a| a > 0.0);
        let has_negative = amounts.iter().any(|&a| a < 0.0);
        if !has_positive || !has_negative {
            return Err(XirrError::invalid_input(
                "cash flows must contain at least one negative and one positive amount",
            ));
        }

        let first_day = days[0];
        if days.iter().all(|&d| d == first_day) {
            let total: f64 = amounts.iter().sum();
            let reason = if total == 0.0 {
                "all cash flows fall on the same date and sum to zero, so every rate is a root"
            } else {
                "all cash flows fall on the same date, so NPV does not depend on the rate"
            };
            return Err(XirrError::invalid_input(reason));
        }

        Ok(Self { amounts, days })
    }

    /// Build a series from any date representation, measuring days from `dates[0]`
    pub fn from_dates<D: TransactionDate>(amounts: &[f64], dates: &[D]) -> XirrResult<Self> {
        check_lengths(amounts.len(), dates.len())?;
        Self::new(amounts.to_vec(), elapsed_days(dates))
    }

    /// Build a series from Unix epoch timestamps in milliseconds (UTC)
    pub fn from_timestamps_millis(amounts: &[f64], timestamps: &[i64]) -> XirrResult<Self> {
        check_lengths(amounts.len(), timestamps.len())?;
        let dates = timestamps
            .iter()
            .map(|&t| from_timestamp_millis(t))
            .collect::<XirrResult<Vec<_>>>()?;
        Self::from_dates(amounts, &dates)
    }

    /// Build a series from ISO-8601 / RFC 3339 date strings
    pub fn from_date_strings<S: AsRef<str>>(amounts: &[f64], dates: &[S]) -> XirrResult<Self> {
        check_lengths(amounts.len(), dates.len())?;
        let parsed = dates
            .iter()
            .map(|s| parse_date(s.as_ref()))
            .collect::<XirrResult<Vec<_>>>()?;
        Self::from_dates(amounts, &parsed)
    }

    pub fn amounts(&self) -> &[f64] {
        &self.amounts
    }

    pub fn days(&self) -> &[f64] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    /// Always false for a validated series
    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    /// Iterate over `(amount, days)` pairs in input order
    pub fn flows(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.amounts.iter().copied().zip(self.days.iter().copied())
    }

    /// Sum of positive amounts
    pub fn gross_inflow(&self) -> f64 {
        self.amounts.iter().filter(|&&a| a > 0.0).sum()
    }

    /// Sum of the magnitudes of negative amounts
    pub fn gross_outflow(&self) -> f64 {
        self.amounts.iter().filter(|&&a| a < 0.0).map(|a| a.abs()).sum()
    }

    /// Sum of the magnitudes of all amounts, used to normalize NPV residuals
    pub fn gross_flow(&self) -> f64 {
        self.gross_inflow() + self.gross_outflow()
    }

    /// Years between the earliest and latest flow
    pub fn span_years(&self) -> f64 {
        let (min, max) = self
            .days
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &d| (lo.min(d), hi.max(d)));
        (max - min) / DAYS_PER_YEAR
    }
}

fn check_lengths(amounts: usize, dates: usize) -> XirrResult<()> {
    if amounts != dates {
        return Err(XirrError::invalid_input(format!(
            "{} amounts but {} dates",
            amounts, dates
        )));
    }
    if amounts < 2 {
        return Err(XirrError::invalid_input(format!(
            "need at least 2 cash flows, got {}",
            amounts
        )));
    }
    Ok(())
}
