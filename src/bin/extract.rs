#![cfg(not(tarpaulin_include))]

use asset_dashboard::extractor::{ExtractConfig, extract};
use clap::Parser;
use std::path::PathBuf;

/// Copy the label/value window of the cost workbook into a small workbook
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Source workbook
    #[arg(long, default_value = "Integrale kosten Wegen v04.0 LIVE.xlsx")]
    source: PathBuf,

    /// Output workbook, overwritten if it exists
    #[arg(long, default_value = "copied_values.xlsx")]
    output: PathBuf,

    #[arg(long, default_value = "Onderhoud")]
    sheet: String,

    #[arg(long, default_value = "Copied Data")]
    output_sheet: String,

    #[arg(long, default_value = "D")]
    label_column: String,

    #[arg(long, default_value = "E")]
    value_column: String,

    /// First row to copy (1-based)
    #[arg(long, default_value_t = 4)]
    first_row: u32,

    /// Last row to copy (inclusive)
    #[arg(long, default_value_t = 28)]
    last_row: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = ExtractConfig {
        sheet: args.sheet,
        label_column: args.label_column,
        value_column: args.value_column,
        first_row: args.first_row,
        last_row: args.last_row,
        output_sheet: args.output_sheet,
    };

    let summary = extract(&args.source, &args.output, &config)?;
    log::info!("Copied {} rows", summary.rows);
    Ok(())
}
