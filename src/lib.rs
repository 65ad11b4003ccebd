#![allow(clippy::const_is_empty)]
#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::type_complexity)]

// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod models;
pub mod report;
pub mod utils;

use std::path::PathBuf;

// Re-export commonly used types
pub use analysis::{PipelineError, PipelineOutput, RunStatus, run_pipeline, run_pipeline_on_points};
pub use config::{
    ANALYSIS, ClassifierPolicy, EntropyEstimatorKind, PERSISTENCE, PipelineConfig, PriceField,
    VolatilityEstimatorKind,
};
pub use data::{fetch_price_series, load_records, save_records, write_price_series_async};
pub use domain::{InstrumentInterval, MarketCondition, PricePoint, Symbol};
pub use models::{PriceSeries, SummaryRecord};
pub use report::{ChartData, ChartField, render_report};

// CLI argument parsing
use clap::{Parser, ValueEnum};

/// Where the price series comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PriceSourceKind {
    /// Binance spot klines (cached locally)
    Binance,
    /// Finnhub stock candles (cached locally, needs a token)
    Finnhub,
    /// A local CSV file given with --input
    Csv,
}

/// Command-line name of a volatility estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VolatilityChoice {
    StrideSpan,
    WindowSpan,
    TrailingLevel,
}

/// Command-line name of a classification policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClassifierChoice {
    EntropyThreshold,
    MedianVolatility,
    Regime,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Price source
    #[arg(long, value_enum, default_value_t = PriceSourceKind::Binance)]
    pub source: PriceSourceKind,

    /// Instrument name (defaults per source; for CSV, the file stem)
    #[arg(long)]
    pub symbol: Option<String>,

    /// Bar interval: Binance shorthand (`1m`, `1h`) or Finnhub resolution (`1`, `60`, `D`)
    #[arg(long)]
    pub interval: Option<String>,

    /// Hours of history to request from an API source
    #[arg(long)]
    pub lookback_hours: Option<i64>,

    /// Price CSV for `--source csv`
    #[arg(long)]
    pub input: Option<PathBuf>,

    #[arg(long, env = "FINNHUB_TOKEN", hide_env_values = true)]
    pub finnhub_token: Option<String>,

    /// Use API as primary source instead of the local cache
    #[arg(long, default_value_t = false)]
    pub prefer_api: bool,

    /// JSON pipeline configuration; flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub window_length: Option<usize>,

    #[arg(long)]
    pub stride: Option<usize>,

    #[arg(long)]
    pub bins: Option<usize>,

    #[arg(long, value_enum)]
    pub entropy: Option<EntropyEstimatorKind>,

    #[arg(long, value_enum)]
    pub volatility: Option<VolatilityChoice>,

    /// Trailing price count for `--volatility trailing-level`
    #[arg(long)]
    pub trailing: Option<usize>,

    #[arg(long, value_enum)]
    pub classifier: Option<ClassifierChoice>,

    #[arg(long)]
    pub bear_below: Option<f64>,

    #[arg(long)]
    pub bull_below: Option<f64>,

    /// Entropy split for `--classifier regime`
    #[arg(long)]
    pub entropy_split: Option<f64>,

    /// Fixed volatility split for `--classifier regime` (run median when absent)
    #[arg(long)]
    pub volatility_split: Option<f64>,

    /// Which price column feeds the pipeline
    #[arg(long, value_enum, default_value_t = PriceField::Close)]
    pub price_field: PriceField,

    /// Summary record CSV to write
    #[arg(long, default_value = PERSISTENCE.output.records_csv)]
    pub output: PathBuf,

    /// Write chart data JSON to this path
    #[arg(long)]
    pub chart_json: Option<PathBuf>,

    /// Record columns to include as time series in the chart data
    #[arg(long, value_enum, value_delimiter = ',', default_values_t = [ChartField::Entropy, ChartField::Volatility])]
    pub plot: Vec<ChartField>,
}

impl Cli {
    pub fn symbol_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.symbol.as_deref().unwrap_or(default)
    }

    pub fn interval_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.interval.as_deref().unwrap_or(default)
    }

    /// Config file (or defaults) with command-line overrides applied, already validated.
    pub fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load_from_path(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(length) = self.window_length {
            config.window_length = length;
        }
        if let Some(stride) = self.stride {
            config.stride = stride;
        }
        if let Some(bins) = self.bins {
            config.bin_count = bins;
        }
        if let Some(entropy) = self.entropy {
            config.entropy_estimator = entropy;
        }

        let current_trailing = match config.volatility_estimator {
            VolatilityEstimatorKind::TrailingLevel { trailing } => trailing,
            _ => ANALYSIS.volatility.trailing_length,
        };
        let trailing = self.trailing.unwrap_or(current_trailing);
        config.volatility_estimator = match (self.volatility, config.volatility_estimator) {
            (Some(VolatilityChoice::StrideSpan), _) => VolatilityEstimatorKind::StrideSpan,
            (Some(VolatilityChoice::WindowSpan), _) => VolatilityEstimatorKind::WindowSpan,
            (Some(VolatilityChoice::TrailingLevel), _)
            | (None, VolatilityEstimatorKind::TrailingLevel { .. }) => {
                VolatilityEstimatorKind::TrailingLevel { trailing }
            }
            (None, current) => current,
        };

        config.classifier = self.classifier_policy(config.classifier);

        config.validate()?;
        Ok(config)
    }

    fn classifier_policy(&self, current: ClassifierPolicy) -> ClassifierPolicy {
        let (bear_default, bull_default) = match current {
            ClassifierPolicy::EntropyThreshold {
                bear_below,
                bull_below,
            } => (bear_below, bull_below),
            _ => (ANALYSIS.classifier.bear_below, ANALYSIS.classifier.bull_below),
        };
        let (entropy_default, volatility_default) = match current {
            ClassifierPolicy::Regime {
                entropy_split,
                volatility_split,
            } => (entropy_split, volatility_split),
            _ => (ANALYSIS.classifier.regime_entropy_split, None),
        };

        let choice = self.classifier.unwrap_or(match current {
            ClassifierPolicy::EntropyThreshold { .. } => ClassifierChoice::EntropyThreshold,
            ClassifierPolicy::MedianVolatility => ClassifierChoice::MedianVolatility,
            ClassifierPolicy::Regime { .. } => ClassifierChoice::Regime,
        });

        match choice {
            ClassifierChoice::EntropyThreshold => ClassifierPolicy::EntropyThreshold {
                bear_below: self.bear_below.unwrap_or(bear_default),
                bull_below: self.bull_below.unwrap_or(bull_default),
            },
            ClassifierChoice::MedianVolatility => ClassifierPolicy::MedianVolatility,
            ClassifierChoice::Regime => ClassifierPolicy::Regime {
                entropy_split: self.entropy_split.unwrap_or(entropy_default),
                volatility_split: self.volatility_split.or(volatility_default),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Cli {
        let mut argv = vec!["market-entropy"];
        argv.extend_from_slice(extra);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_no_flags_gives_default_config() {
        let cli = parse(&[]);
        assert_eq!(cli.source, PriceSourceKind::Binance);
        assert_eq!(cli.output, PathBuf::from(PERSISTENCE.output.records_csv));
        assert_eq!(cli.plot, vec![ChartField::Entropy, ChartField::Volatility]);
        assert_eq!(cli.pipeline_config().unwrap(), PipelineConfig::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = parse(&[
            "--window-length",
            "20",
            "--stride",
            "5",
            "--entropy",
            "bins",
            "--bins",
            "6",
            "--volatility",
            "trailing-level",
            "--trailing",
            "7",
            "--classifier",
            "regime",
            "--entropy-split",
            "0.8",
            "--plot",
            "volatility",
        ]);
        let config = cli.pipeline_config().unwrap();
        assert_eq!(config.window_length, 20);
        assert_eq!(config.stride, 5);
        assert_eq!(config.bin_count, 6);
        assert_eq!(config.entropy_estimator, EntropyEstimatorKind::Bins);
        assert_eq!(
            config.volatility_estimator,
            VolatilityEstimatorKind::TrailingLevel { trailing: 7 }
        );
        assert_eq!(
            config.classifier,
            ClassifierPolicy::Regime {
                entropy_split: 0.8,
                volatility_split: None
            }
        );
        assert_eq!(cli.plot, vec![ChartField::Volatility]);
    }

    #[test]
    fn test_thresholds_apply_to_default_policy() {
        let cli = parse(&["--bear-below", "0.3", "--bull-below", "1.0"]);
        assert_eq!(
            cli.pipeline_config().unwrap().classifier,
            ClassifierPolicy::EntropyThreshold {
                bear_below: 0.3,
                bull_below: 1.0
            }
        );
    }

    #[test]
    fn test_invalid_overrides_rejected_before_fetching() {
        assert!(parse(&["--stride", "0"]).pipeline_config().is_err());
        assert!(
            parse(&["--bear-below", "2.0", "--bull-below", "1.0"])
                .pipeline_config()
                .is_err()
        );
    }
}
