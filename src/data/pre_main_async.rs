// Async price loading that runs in main before the pipeline starts

use anyhow::{Context, Result, anyhow};

use crate::config::{BINANCE, FINNHUB, PERSISTENCE};
#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;
use crate::data::timeseries::bnapi_version::BinanceKlines;
use crate::data::timeseries::csv_version::CsvPrices;
use crate::data::timeseries::finnhub_version::FinnhubCandles;
use crate::data::timeseries::serde_version::{LocalCache, check_local_data_validity};
use crate::data::timeseries::{CreatePriceSeries, get_price_series_async};
use crate::domain::InstrumentInterval;
use crate::models::PriceSeries;
use crate::utils::TimeUtils;
use crate::{Cli, PriceSourceKind};

/// Order an API provider against its local cache.
/// If the cache fails validation the API is the only choice; otherwise `prefer_api` decides.
fn cached_api_chain(
    api: Box<dyn CreatePriceSeries>,
    source_key: &'static str,
    instrument: &InstrumentInterval,
    prefer_api: bool,
) -> Vec<Box<dyn CreatePriceSeries>> {
    let local = || -> Box<dyn CreatePriceSeries> {
        Box::new(LocalCache {
            source_key,
            instrument: instrument.clone(),
        })
    };
    match (
        prefer_api,
        check_local_data_validity(
            source_key,
            instrument,
            PERSISTENCE.cache.acceptable_age_secs,
            PERSISTENCE.cache.version,
        ),
    ) {
        (false, Ok(_)) => vec![local(), api], // local first
        (true, Ok(_)) => vec![api, local()],  // API first
        (_, Err(e)) => {
            log::warn!("⚠️  Local cache validation failed: {:#}", e);
            log::warn!("⚠️  Falling back to {}...", api.signature());
            vec![api] // API only
        }
    }
}

fn build_providers(args: &Cli) -> Result<Vec<Box<dyn CreatePriceSeries>>> {
    let providers: Vec<Box<dyn CreatePriceSeries>> = match args.source {
        PriceSourceKind::Binance => {
            let interval = args.interval_or(BINANCE.fetch.interval);
            let interval_ms = TimeUtils::interval_from_string(interval)
                .ok_or_else(|| anyhow!("Unsupported Binance interval: {}", interval))?;
            let instrument = InstrumentInterval::new(args.symbol_or(BINANCE.fetch.symbol), interval_ms);
            let api = Box::new(BinanceKlines {
                instrument: instrument.clone(),
                lookback_hours: args.lookback_hours.unwrap_or(BINANCE.fetch.lookback_hours),
            });
            cached_api_chain(api, "binance", &instrument, args.prefer_api)
        }
        PriceSourceKind::Finnhub => {
            let token = args
                .finnhub_token
                .clone()
                .context("Finnhub source needs --finnhub-token (or FINNHUB_TOKEN)")?;
            let api = FinnhubCandles::new(
                args.symbol_or(FINNHUB.symbol),
                args.interval_or(FINNHUB.resolution),
                args.lookback_hours.unwrap_or(FINNHUB.lookback_hours),
                token,
            )?;
            let instrument = api.instrument.clone();
            cached_api_chain(Box::new(api), "finnhub", &instrument, args.prefer_api)
        }
        PriceSourceKind::Csv => {
            let path = args
                .input
                .clone()
                .context("CSV source needs --input <FILE>")?;
            let interval = args.interval_or("1m");
            let interval_ms = TimeUtils::interval_from_string(interval)
                .ok_or_else(|| anyhow!("Unsupported interval: {}", interval))?;
            let name = args.symbol.clone().unwrap_or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "CSV".to_string())
            });
            vec![Box::new(CsvPrices {
                path,
                instrument: InstrumentInterval::new(name, interval_ms),
            })]
        }
    };
    Ok(providers)
}

/// Load the price series the command line asks for, returning which provider produced it.
pub async fn fetch_price_series(args: &Cli) -> Result<(PriceSeries, &'static str)> {
    let providers = build_providers(args)?;

    let (series, signature) = get_price_series_async(&providers)
        .await
        .context("Failed to retrieve price data")?;

    #[cfg(debug_assertions)]
    if DEBUG_FLAGS.print_serde {
        log::info!(
            "Successfully retrieved {} prices of {} using: {}.",
            series.len(),
            series.instrument,
            signature
        );
    }
    Ok((series, signature))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[tokio::test]
    async fn test_csv_source_loads_the_file() {
        let dir = std::env::temp_dir().join(format!("market_entropy_fetch_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("spy.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Price\n100\n101\n100.5").unwrap();
        drop(file);

        let args = Cli::parse_from([
            "market-entropy",
            "--source",
            "csv",
            "--input",
            path.to_str().unwrap(),
        ]);
        let (series, signature) = fetch_price_series(&args).await.unwrap();
        assert_eq!(signature, crate::data::timeseries::csv_version::CSV_SIGNATURE);
        assert_eq!(series.close_prices, vec![100.0, 101.0, 100.5]);
        assert_eq!(series.instrument.name(), "SPY");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_inputs_are_reported() {
        let args = Cli::parse_from(["market-entropy", "--source", "csv"]);
        assert!(build_providers(&args).is_err());

        let args = Cli::parse_from(["market-entropy", "--source", "finnhub"]);
        if args.finnhub_token.is_none() {
            assert!(build_providers(&args).is_err());
        }
    }
}
