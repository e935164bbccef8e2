//! XIRR root finding: NPV kernel, Newton-Raphson and bracketing fallback

mod discount;
mod newton;
mod bracket;
mod config;
mod engine;

pub use discount::{npv, npv_derivative, DAYS_PER_YEAR};
pub use config::{
    XirrConfig, InitialGuess, DEFAULT_INITIAL_GUESS, DEFAULT_NPV_TOLERANCE,
    DEFAULT_STEP_TOLERANCE, DEFAULT_MAX_ITERATIONS, DEFAULT_BRACKET_LOWER, DEFAULT_BRACKET_UPPER,
};
pub use engine::{xirr, xirr_with_config, solve, solve_batch, Solution, SolveMethod};
