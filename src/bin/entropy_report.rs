use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use market_entropy::{ChartData, ChartField, PERSISTENCE, load_records, render_report};

/// Re-read a saved record CSV and print the correlation and condition report.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct ReportArgs {
    /// Summary record CSV written by market-entropy
    #[arg(long, default_value = PERSISTENCE.output.records_csv)]
    records: PathBuf,

    /// Also write chart data JSON to this path
    #[arg(long)]
    chart_json: Option<PathBuf>,

    /// Record columns to include as time series in the chart data
    #[arg(long, value_enum, value_delimiter = ',', default_values_t = [ChartField::Entropy, ChartField::Volatility])]
    plot: Vec<ChartField>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = ReportArgs::parse();
    let records = load_records(&args.records)?;
    log::info!(
        "Loaded {} records from {}",
        records.len(),
        args.records.display()
    );

    println!("{}", render_report(&records));

    if let Some(path) = &args.chart_json {
        ChartData::build(&records, &args.plot).save_to_path(path)?;
        println!("✅ Chart data written to {}", path.display());
    }
    Ok(())
}
