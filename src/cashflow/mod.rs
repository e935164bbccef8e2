//! Cash flow series, date normalization and CSV input

mod series;
pub mod dates;
pub mod loader;

pub use series::CashFlowSeries;
pub use dates::{TransactionDate, parse_date, elapsed_days};
pub use loader::{NamedSeries, load_series, load_series_from_reader};
