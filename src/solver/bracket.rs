//! Bracketing fallback: locate a sign change, then bisect

use super::config::XirrConfig;
use super::discount::{normalized_residual, npv_and_derivative, npv_at_rate};
use super::engine::{SolveMethod, Solution};
use crate::cashflow::CashFlowSeries;
use crate::error::{XirrError, XirrResult};

/// First step taken away from the guess when searching for a bracket
const INITIAL_BRACKET_STEP: f64 = 0.01;

/// The doubling step stops growing here and the walk becomes a fixed scan
const MAX_BRACKET_STEP: f64 = 0.1;

/// Bisections of the slope used to locate a turning point inside one step
const TURNING_POINT_ITERATIONS: usize = 60;

/// Find `(lo, hi)` inside `[lower, upper]` where the NPV changes sign
///
/// Walks outward from `guess` in both directions, doubling the step up to
/// `MAX_BRACKET_STEP`, so the bracket returned is the first one met near the
/// guess. A step whose endpoints share a sign is still searched when the NPV
/// turns inside it, which catches two roots closer together than one step.
/// Points where the NPV overflows are skipped.
pub(crate) fn find_bracket(
    series: &CashFlowSeries,
    guess: f64,
    lower: f64,
    upper: f64,
) -> Option<(f64, f64)> {
    let start = guess.clamp(lower, upper);
    let f_start = npv_at_rate(series, start);
    if f_start == 0.0 {
        return Some((start, start));
    }

    let mut left = (start, f_start);
    let mut right = (start, f_start);
    let mut step = INITIAL_BRACKET_STEP;

    while left.0 > lower || right.0 < upper {
        if right.0 < upper {
            let r = (right.0 + step).min(upper);
            let f = npv_at_rate(series, r);
            if f.is_finite() {
                if changes_sign(right.1, f) {
                    return Some((right.0, r));
                }
                if let Some(bracket) = split_at_turning_point(series, right, (r, f)) {
                    return Some(bracket);
                }
                right = (r, f);
            } else {
                right.0 = r;
            }
        }

        if left.0 > lower {
            let r = (left.0 - step).max(lower);
            let f = npv_at_rate(series, r);
            if f.is_finite() {
                if changes_sign(left.1, f) {
                    return Some((r, left.0));
                }
                if let Some(bracket) = split_at_turning_point(series, (r, f), left) {
                    return Some(bracket);
                }
                left = (r, f);
            } else {
                left.0 = r;
            }
        }

        step = (step * 2.0).min(MAX_BRACKET_STEP);
    }

    None
}

/// Bracket a root hidden between `lo` and `hi`, whose NPVs share a sign
///
/// When the slope changes sign across the interval, the turning point is
/// located by bisecting the slope. If the NPV there has the other sign, the
/// sub-interval from `lo` to the turning point holds a root.
fn split_at_turning_point(
    series: &CashFlowSeries,
    lo: (f64, f64),
    hi: (f64, f64),
) -> Option<(f64, f64)> {
    let slope = |rate: f64| npv_and_derivative(series, rate).1;
    let slope_lo = slope(lo.0);
    let slope_hi = slope(hi.0);
    if !slope_lo.is_finite() || !slope_hi.is_finite() || slope_lo.signum() == slope_hi.signum() {
        return None;
    }

    let (mut a, mut b) = (lo.0, hi.0);
    for _ in 0..TURNING_POINT_ITERATIONS {
        let mid = a + (b - a) / 2.0;
        if slope(mid).signum() == slope_lo.signum() {
            a = mid;
        } else {
            b = mid;
        }
    }

    let turn = a + (b - a) / 2.0;
    if changes_sign(lo.1, npv_at_rate(series, turn)) {
        Some((lo.0, turn))
    } else {
        None
    }
}

fn changes_sign(a: f64, b: f64) -> bool {
    a.is_finite() && b.is_finite() && (a == 0.0 || b == 0.0 || a.signum() != b.signum())
}

/// Bisection on a bracket `[low, high]` whose endpoint NPVs differ in sign
///
/// Stops when the NPV meets the tolerance or when the half-width of the
/// bracket falls below the step tolerance. Far below `-0.5` over long
/// horizons the discounted flows dwarf the gross flow, and rounding keeps the
/// NPV residual above tolerance even once the bracket is a few ulps wide.
pub(crate) fn bisect(
    series: &CashFlowSeries,
    low: f64,
    high: f64,
    config: &XirrConfig,
) -> XirrResult<Solution> {
    let mut low = low;
    let mut high = high;
    let mut npv_low = npv_at_rate(series, low);
    let npv_high = npv_at_rate(series, high);

    if normalized_residual(series, npv_low) < config.npv_tolerance {
        return Ok(Solution::new(low, npv_low, 0, SolveMethod::Bisection));
    }
    if normalized_residual(series, npv_high) < config.npv_tolerance {
        return Ok(Solution::new(high, npv_high, 0, SolveMethod::Bisection));
    }
    if !changes_sign(npv_low, npv_high) {
        return Err(XirrError::NoRootFound { lower: low, upper: high });
    }

    let mut mid = low;
    let mut residual = f64::INFINITY;

    for iteration in 0..config.max_iterations {
        let half_width = (high - low) / 2.0;
        mid = low + half_width;
        let npv_mid = npv_at_rate(series, mid);
        residual = normalized_residual(series, npv_mid);

        if residual < config.npv_tolerance || half_width < config.step_tolerance {
            return Ok(Solution::new(mid, npv_mid, iteration + 1, SolveMethod::Bisection));
        }

        if npv_mid.signum() == npv_low.signum() {
            low = mid;
            npv_low = npv_mid;
        } else {
            high = mid;
        }
    }

    Err(XirrError::Convergence {
        iterations: config.max_iterations,
        rate: mid,
        residual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_bracket_near_guess() {
        // Roots at 0% and 50%
        let series = CashFlowSeries::new(vec![-1.0, 2.5, -1.5], vec![0.0, 365.0, 730.0]).unwrap();
        let (lo, hi) = find_bracket(&series, 0.4, -0.99, 10.0).unwrap();
        assert!(lo < hi);
        assert!(lo <= 0.5 && 0.5 <= hi);
    }

    #[test]
    fn test_bracket_below_guess() {
        let series = CashFlowSeries::new(vec![-1000.0, 100.0], vec![0.0, 365.0]).unwrap();
        let (lo, hi) = find_bracket(&series, 0.1, -0.99, 10.0).unwrap();
        assert!(lo <= -0.9 && -0.9 <= hi);
    }

    #[test]
    fn test_no_bracket() {
        // Root at -99.9%, outside the search range
        let series = CashFlowSeries::new(vec![-1000.0, 1.0], vec![0.0, 365.0]).unwrap();
        assert!(find_bracket(&series, 0.1, -0.99, 10.0).is_none());
    }

    #[test]
    fn test_bracket_skips_overflow() {
        // 200 years out: discounting at -99% overflows, root at 2^(1/200) - 1
        let series = CashFlowSeries::new(vec![-1.0, 2.0], vec![0.0, 73_000.0]).unwrap();
        assert!(npv_at_rate(&series, -0.99).is_infinite());

        let (lo, hi) = find_bracket(&series, -0.99, -0.99, 10.0).unwrap();
        let root = 2.0_f64.powf(1.0 / 200.0) - 1.0;
        assert!(lo <= root && root <= hi);

        let solution = bisect(&series, lo, hi, &XirrConfig::default()).unwrap();
        assert_abs_diff_eq!(solution.rate, root, epsilon = 1e-9);
    }

    #[test]
    fn test_close_roots_inside_one_step() {
        // Roots at 0% and 4.1667%, both endpoints of [-5%, 10%] positive
        let series = CashFlowSeries::new(vec![0.96, -1.96, 1.0], vec![0.0, 365.0, 730.0]).unwrap();
        assert!(npv_at_rate(&series, -0.05) > 0.0);
        assert!(npv_at_rate(&series, 0.1) > 0.0);

        let lo = (-0.05, npv_at_rate(&series, -0.05));
        let hi = (0.1, npv_at_rate(&series, 0.1));
        let (a, b) = split_at_turning_point(&series, lo, hi).unwrap();
        assert_abs_diff_eq!(a, -0.05);
        assert!(a <= 0.0 && 0.0 <= b);
        assert!(b < 0.04);
    }

    #[test]
    fn test_close_roots_found_from_far_guess() {
        let series =
            CashFlowSeries::new(vec![-944_310.0, -100_799.7, 34.5, 295_709.1], vec![0.0, 1391.0, 1450.0, 1076.0])
                .unwrap();
        let (lo, hi) = find_bracket(&series, 0.0712, -0.99, 10.0).unwrap();
        assert!(changes_sign(npv_at_rate(&series, lo), npv_at_rate(&series, hi)));
        assert!(lo > -0.6625 && hi < -0.45);
    }

    #[test]
    fn test_bisection() {
        let series = CashFlowSeries::new(vec![-1000.0, 1210.0], vec![0.0, 730.0]).unwrap();
        let solution = bisect(&series, -0.5, 1.0, &XirrConfig::default()).unwrap();
        assert_abs_diff_eq!(solution.rate, 0.1, epsilon = 1e-9);
        assert_eq!(solution.method, SolveMethod::Bisection);
    }

    #[test]
    fn test_bisection_stops_on_bracket_width() {
        // Root near -87.16% with flows 27 years out: the NPV never meets
        // the residual tolerance, but the bracket closes around the root
        let series =
            CashFlowSeries::new(vec![-394_632.0, -282_069.0, 99_111.0], vec![0.0, 9708.0, 9894.0]).unwrap();
        let solution = bisect(&series, -0.9, -0.8, &XirrConfig::default()).unwrap();
        assert_abs_diff_eq!(solution.rate, -0.8715814, epsilon = 1e-5);
        assert!(solution.iterations < 100);
        let below = npv_at_rate(&series, solution.rate - 1e-9);
        let above = npv_at_rate(&series, solution.rate + 1e-9);
        assert!(changes_sign(below, above));
    }

    #[test]
    fn test_bisection_rejects_non_bracket() {
        let series = CashFlowSeries::new(vec![-1000.0, 1210.0], vec![0.0, 730.0]).unwrap();
        let result = bisect(&series, 0.5, 1.0, &XirrConfig::default());
        assert!(matches!(result, Err(XirrError::NoRootFound { .. })));
    }

    #[test]
    fn test_bisection_cap() {
        let series = CashFlowSeries::new(vec![-1000.0, 1210.0], vec![0.0, 730.0]).unwrap();
        let config = XirrConfig { max_iterations: 3, ..XirrConfig::default() };
        let result = bisect(&series, -0.5, 1.0, &config);
        assert!(matches!(result, Err(XirrError::Convergence { iterations: 3, .. })));
    }
}
