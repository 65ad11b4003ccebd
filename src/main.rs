use anyhow::{Context, Result};
use clap::Parser;
use tokio::runtime::Runtime;

use market_entropy::{
    ChartData, Cli, RunStatus, fetch_price_series, render_report, run_pipeline_on_points,
    save_records, write_price_series_async,
};

fn main() -> Result<()> {
    // A. Init Logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    // B. Parse Args (configuration problems stop us before any network call)
    let args = Cli::parse();
    let config = args.pipeline_config()?;
    #[cfg(debug_assertions)]
    log::info!("Pipeline configuration: {:?}", config);

    // C. Data Loading (Blocking)
    let rt = Runtime::new().context("Failed to create Tokio runtime")?;
    let (series, signature) = rt.block_on(fetch_price_series(&args))?;

    // D. Background Cache Write
    let cache_write = rt.spawn(write_price_series_async(signature, series.clone()));

    // E. Pipeline
    let points = series.price_points(args.price_field);
    let output = run_pipeline_on_points(&points, &config)?;
    match output.status() {
        RunStatus::Completed => log::info!(
            "✅ {} windows from {} {} prices of {}",
            output.records.len(),
            output.price_count,
            args.price_field,
            series.instrument
        ),
        status => log::warn!("⚠️  {}: no records produced for {}", status, series.instrument),
    }

    // F. Outputs
    save_records(&args.output, &output.records)?;
    log::info!("Saved {} records to {}", output.records.len(), args.output.display());

    println!("{}", render_report(&output.records));

    if let Some(path) = &args.chart_json {
        ChartData::build(&output.records, &args.plot).save_to_path(path)?;
        log::info!("Saved chart data to {}", path.display());
    }

    match rt.block_on(cache_write) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::error!("⚠️  Failed to write cache: {:#}", e),
        Err(e) => log::error!("⚠️  Cache write task failed: {}", e),
    }
    Ok(())
}
