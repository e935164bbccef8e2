//! Net present value of a dated cash flow series

use crate::cashflow::CashFlowSeries;
use crate::error::{XirrError, XirrResult};

/// Day count for one compounding year (fixed 365-day convention)
pub const DAYS_PER_YEAR: f64 = 365.0;

/// NPV of the series at an annual rate
///
/// `npv(r) = Σ amount_i / (1 + r)^(days_i / 365)`
pub fn npv(series: &CashFlowSeries, rate: f64) -> XirrResult<f64> {
    check_domain(rate)?;
    Ok(npv_at_rate(series, rate))
}

/// Derivative of the NPV with respect to the rate
///
/// `npv'(r) = Σ -amount_i · t_i / (1 + r)^(t_i + 1)` with `t_i = days_i / 365`
pub fn npv_derivative(series: &CashFlowSeries, rate: f64) -> XirrResult<f64> {
    check_domain(rate)?;
    Ok(npv_and_derivative(series, rate).1)
}

/// Reject rates where `1 + rate` is not positive
pub(crate) fn check_domain(rate: f64) -> XirrResult<()> {
    if rate.is_finite() && 1.0 + rate > 0.0 {
        Ok(())
    } else {
        Err(XirrError::Domain { rate })
    }
}

/// Calculate NPV and its derivative in one pass. `rate` must be > -1.
pub(crate) fn npv_and_derivative(series: &CashFlowSeries, rate: f64) -> (f64, f64) {
    let base = 1.0 + rate;
    let mut npv = 0.0;
    let mut dnpv = 0.0;

    for (amount, days) in series.flows() {
        let t = days / DAYS_PER_YEAR;
        let discount = base.powf(-t);
        npv += amount * discount;
        dnpv -= amount * t * discount / base;
    }

    (npv, dnpv)
}

/// Calculate NPV at a rate. `rate` must be > -1.
pub(crate) fn npv_at_rate(series: &CashFlowSeries, rate: f64) -> f64 {
    let base = 1.0 + rate;
    series
        .flows()
        .map(|(amount, days)| amount * base.powf(-days / DAYS_PER_YEAR))
        .sum()
}

/// NPV magnitude per unit of gross cash flow
pub(crate) fn normalized_residual(series: &CashFlowSeries, npv: f64) -> f64 {
    npv.abs() / series.gross_flow()
}
