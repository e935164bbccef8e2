//! XIRR - extended internal rate of return for irregularly dated cash flows
//!
//! This library provides:
//! - Validated cash flow series built from dates, date-times, timestamps or ISO strings
//! - NPV and its derivative on a 365-day year
//! - Newton-Raphson solving with a bracketing + bisection fallback
//! - Parallel batch solving of independent series

pub mod error;
pub mod cashflow;
pub mod solver;

// Re-export commonly used types
pub use error::{XirrError, XirrResult};
pub use cashflow::{CashFlowSeries, TransactionDate};
pub use solver::{xirr, xirr_with_config, solve, solve_batch, npv, XirrConfig, InitialGuess, Solution, SolveMethod};
