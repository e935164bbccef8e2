//! XIRR CLI
//!
//! Reads `date,amount[,series]` CSV and prints the XIRR of each series.
//! Set RUST_LOG=debug for loader and solver diagnostics.

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::time::Instant;

use xirr::cashflow::{load_series, load_series_from_reader, NamedSeries};
use xirr::{solve_batch, InitialGuess, SolveMethod, XirrConfig};

#[derive(Parser, Debug)]
#[command(name = "xirr", version, about = "Compute the XIRR of dated cash flows")]
struct Args {
    /// CSV file with date,amount[,series] columns ("-" reads stdin)
    input: PathBuf,

    /// JSON file with solver configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Starting rate for Newton-Raphson (decimal, e.g. 0.1)
    #[arg(long, allow_hyphen_values = true)]
    guess: Option<f64>,

    /// Estimate the starting rate from the flows instead of a fixed guess
    #[arg(long, conflicts_with = "guess")]
    horizon_guess: bool,

    /// NPV tolerance relative to the gross cash flow
    #[arg(long)]
    npv_tolerance: Option<f64>,

    /// Iteration cap for each method
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Fail instead of falling back to bisection when Newton-Raphson fails
    #[arg(long)]
    no_fallback: bool,

    /// Print rates in percent
    #[arg(long)]
    percent: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct SeriesOutput {
    series: String,
    flows: usize,
    rate: Option<f64>,
    rate_pct: Option<f64>,
    iterations: Option<usize>,
    method: Option<SolveMethod>,
    error: Option<String>,
}

fn build_config(args: &Args) -> Result<XirrConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Unable to open config {}", path.display()))?;
            serde_json::from_reader(file)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => XirrConfig::default(),
    };

    if let Some(guess) = args.guess {
        config.initial_guess = InitialGuess::Fixed(guess);
    }
    if args.horizon_guess {
        config.initial_guess = InitialGuess::ReturnOverHorizon;
    }
    if let Some(tolerance) = args.npv_tolerance {
        config.npv_tolerance = tolerance;
    }
    if let Some(max_iterations) = args.max_iterations {
        config.max_iterations = max_iterations;
    }
    if args.no_fallback {
        config.fallback = false;
    }

    config.validate().context("Invalid solver configuration")?;
    Ok(config)
}

fn load(args: &Args) -> Result<Vec<NamedSeries>> {
    let loaded = if args.input.as_os_str() == "-" {
        load_series_from_reader(io::stdin().lock())
    } else {
        load_series(&args.input)
    };
    loaded.with_context(|| format!("Failed to load cash flows from {}", args.input.display()))
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = build_config(&args)?;
    log::debug!("solver config: {:?}", config);

    let start = Instant::now();
    let named = load(&args)?;
    log::info!("Loaded {} series in {:?}", named.len(), start.elapsed());

    let series: Vec<_> = named.iter().map(|n| n.series.clone()).collect();
    let results = solve_batch(&series, &config);
    log::info!("Solved {} series in {:?}", results.len(), start.elapsed());

    let outputs: Vec<SeriesOutput> = named
        .iter()
        .zip(results)
        .map(|(n, result)| match result {
            Ok(solution) => {
                log::debug!(
                    "{}: rate {} via {:?} in {} iterations (npv {:.3e})",
                    n.name, solution.rate, solution.method, solution.iterations, solution.npv
                );
                SeriesOutput {
                    series: n.name.clone(),
                    flows: n.series.len(),
                    rate: Some(solution.rate),
                    rate_pct: Some(solution.rate_percent()),
                    iterations: Some(solution.iterations),
                    method: Some(solution.method),
                    error: None,
                }
            }
            Err(err) => SeriesOutput {
                series: n.name.clone(),
                flows: n.series.len(),
                rate: None,
                rate_pct: None,
                iterations: None,
                method: None,
                error: Some(err.to_string()),
            },
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outputs)?);
    } else {
        for output in &outputs {
            match (output.rate, output.rate_pct, &output.error) {
                (Some(_), Some(pct), _) if args.percent => println!("{}: {:.6}%", output.series, pct),
                (Some(rate), _, _) => println!("{}: {:.10}", output.series, rate),
                (_, _, Some(err)) => println!("{}: error: {}", output.series, err),
                _ => {}
            }
        }
    }

    let failures = outputs.iter().filter(|o| o.error.is_some()).count();
    if failures > 0 {
        bail!("{} of {} series failed", failures, outputs.len());
    }

    Ok(())
}
