//! Load cash flow series from CSV
//!
//! Expected columns: `date,amount` with an optional `series` column. Rows
//! sharing a `series` label form one series; rows keep their file order.

use csv::Reader;
use std::io::Read;
use std::path::Path;

use super::CashFlowSeries;
use crate::error::XirrResult;

/// Label used when the file has no `series` column
pub const DEFAULT_SERIES_NAME: &str = "default";

/// Raw CSV row
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    date: String,
    amount: f64,
    #[serde(default)]
    series: Option<String>,
}

/// A labelled series read from a file
#[derive(Debug, Clone)]
pub struct NamedSeries {
    pub name: String,
    pub series: CashFlowSeries,
}

/// Load all series from a CSV file
pub fn load_series<P: AsRef<Path>>(path: P) -> XirrResult<Vec<NamedSeries>> {
    let reader = Reader::from_path(path)?;
    collect_series(reader)
}

/// Load series from any reader (e.g., string buffer, stdin)
pub fn load_series_from_reader<R: Read>(reader: R) -> XirrResult<Vec<NamedSeries>> {
    collect_series(Reader::from_reader(reader))
}

fn collect_series<R: Read>(mut reader: Reader<R>) -> XirrResult<Vec<NamedSeries>> {
    // (name, dates, amounts) in order of first appearance
    let mut groups: Vec<(String, Vec<String>, Vec<f64>)> = Vec::new();

    for result in reader.deserialize() {
        let row: CsvRow = result?;
        let name = row
            .series
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERIES_NAME.to_string());

        match groups.iter_mut().find(|(n, _, _)| *n == name) {
            Some((_, dates, amounts)) => {
                dates.push(row.date);
                amounts.push(row.amount);
            }
            None => groups.push((name, vec![row.date], vec![row.amount])),
        }
    }

    groups
        .into_iter()
        .map(|(name, dates, amounts)| {
            log::debug!("series '{}': {} cash flows", name, amounts.len());
            let series = CashFlowSeries::from_date_strings(&amounts, &dates)?;
            Ok(NamedSeries { name, series })
        })
        .collect()
}
