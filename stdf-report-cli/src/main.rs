//! STDF Report CLI Application
//!
//! Command-line front end for the report engines. It uses the stdf-decoder
//! library and adds:
//! - Device segmentation and the per-device "Device Summary" pivot
//! - Bin labelling and limit checks
//! - Condition grouping, statistics and code comparison of pivoted sheets
//! - Workbook output (xlsx)

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

mod classify;
mod config;
mod convert;
mod error;
mod numeric;
mod pivot;
mod report;
mod segment;
mod store;
mod transpose;
mod workbook;

#[cfg(test)]
mod fixtures;

use config::{AppConfig, ConvertConfig, TransposeConfig};
use error::ReportError;

/// STDF Report - Turn parametric test data into spreadsheet reports
#[derive(Parser, Debug)]
#[command(name = "stdf-report")]
#[command(about = "Convert STDF test data and pivoted sheets into xlsx reports", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print a JSON summary of each conversion on stdout
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert STDF files into "Device Summary" workbooks
    Convert {
        /// STDF file(s) to convert
        #[arg(required = true, value_name = "INPUT")]
        inputs: Vec<PathBuf>,

        /// Output workbook (only with a single input; default: <input>.xlsx)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Regroup a pivoted sheet by test condition with statistics and comparisons
    Transpose {
        /// Pivoted sheet (.xlsx, .xlsm, .xlsb, .xls, .ods or .csv)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output workbook (default: Transposed_<name>.xlsx next to the input)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("STDF Report CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", stdf_decoder::VERSION);

    let config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            let config = config::load_config(path)?;
            log::debug!("Configuration loaded successfully");
            config
        }
        None => AppConfig::default(),
    };

    match &args.command {
        Command::Convert { inputs, output } => {
            convert_mode(inputs, output.as_deref(), &config.convert, &args)
        }
        Command::Transpose { input, output } => {
            transpose_mode(input, output.as_deref(), &config.transpose, &args)
        }
    }
}

/// Convert every input independently; fails if any conversion failed
fn convert_mode(
    inputs: &[PathBuf],
    output: Option<&Path>,
    config: &ConvertConfig,
    args: &Args,
) -> Result<()> {
    if output.is_some() && inputs.len() > 1 {
        bail!("--output can only be used with a single input file");
    }

    let jobs: Vec<(PathBuf, PathBuf)> = inputs
        .iter()
        .map(|input| {
            let out = output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| convert::default_output_path(input));
            (input.clone(), out)
        })
        .collect();

    let results: Vec<_> = jobs
        .par_iter()
        .map(|(input, out)| (input, convert::convert_file(input, out, config)))
        .collect();

    let mut failed = 0usize;
    for (input, result) in results {
        match result {
            Ok(summary) => {
                if args.json {
                    println!("{}", serde_json::to_string(&summary)?);
                } else if !args.quiet {
                    println!(
                        "✓ {:?} → {:?} ({} device(s), {} test(s), {} out of limits)",
                        summary.input,
                        summary.output,
                        summary.devices,
                        summary.tests,
                        summary.flagged_cells
                    );
                }
            }
            Err(e) => {
                failed += 1;
                report_failure(input, &e);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} conversion(s) failed", failed, inputs.len());
    }
    Ok(())
}

fn transpose_mode(
    input: &Path,
    output: Option<&Path>,
    config: &TransposeConfig,
    args: &Args,
) -> Result<()> {
    let out = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| transpose::default_output_path(input));

    let summary = match transpose::transpose_file(input, &out, config) {
        Ok(summary) => summary,
        Err(e) => {
            report_failure(input, &e);
            return Err(e).with_context(|| format!("Failed to transpose {:?}", input));
        }
    };

    if args.json {
        println!("{}", serde_json::to_string(&summary)?);
    } else if !args.quiet {
        println!("✓ Transposed file saved as: {:?}", summary.output);
        println!("  Sheets: {}", summary.sheets.join(", "));
    }
    Ok(())
}

/// Log a failed conversion, separating bad input from internal failures
fn report_failure(input: &Path, err: &ReportError) {
    if err.is_missing_data() {
        log::error!("{:?}: input is missing required data: {}", input, err);
    } else {
        log::error!("{:?}: conversion failed: {}", input, err);
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
