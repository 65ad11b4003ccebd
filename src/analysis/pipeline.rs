//! Batch entry point: prices in, ordered summary records out.
//!
//! Everything runs on one thread over fully materialized vectors. Configuration is checked
//! before any price is looked at, and no record leaves here unless every stage succeeded.

#[cfg(debug_assertions)]
use crate::config::DEBUG_FLAGS;

use crate::analysis::classifier::ConditionClassifier;
use crate::analysis::entropy::{binned_price_entropy, transition_entropy};
use crate::analysis::records::build_summary_records;
use crate::analysis::symbolizer::symbolize;
use crate::analysis::volatility::estimate_volatility;
use crate::analysis::window::{Window, WindowSlicer};
use crate::analysis::PipelineError;
use crate::config::{EntropyEstimatorKind, PipelineConfig};
use crate::domain::price_point::price_values;
use crate::domain::PricePoint;
use crate::models::SummaryRecord;

/// How a successful run ended. Lets callers tell "ran, produced nothing" apart from failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum RunStatus {
    /// At least one window was produced
    Completed,
    /// Enough prices to symbolize, but fewer symbols than one window needs
    NoWindows,
    /// Fewer than two prices, so not a single transition exists
    InputTooShort,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub records: Vec<SummaryRecord>,
    pub windows: Vec<Window>,
    pub price_count: usize,
    pub symbol_count: usize,
}

impl PipelineOutput {
    fn empty(price_count: usize, symbol_count: usize) -> Self {
        PipelineOutput {
            records: Vec::new(),
            windows: Vec::new(),
            price_count,
            symbol_count,
        }
    }

    pub fn status(&self) -> RunStatus {
        if self.price_count < 2 {
            RunStatus::InputTooShort
        } else if self.records.is_empty() {
            RunStatus::NoWindows
        } else {
            RunStatus::Completed
        }
    }
}

pub fn run_pipeline(
    prices: &[f64],
    config: &PipelineConfig,
) -> Result<PipelineOutput, PipelineError> {
    config.validate()?;

    if let Some((index, &value)) = prices.iter().enumerate().find(|(_, p)| !p.is_finite()) {
        return Err(PipelineError::NonFinitePrice { index, value });
    }

    if prices.len() < 2 {
        log::warn!(
            "⚠️ Only {} price(s) supplied; nothing to analyse",
            prices.len()
        );
        return Ok(PipelineOutput::empty(prices.len(), 0));
    }

    let symbols = symbolize(prices);
    let slicer = WindowSlicer::new(config.window_length, config.stride)?;
    let windows = slicer.windows(symbols.len());
    if windows.is_empty() {
        log::warn!(
            "⚠️ {} symbols is shorter than one window of {}; no windows produced",
            symbols.len(),
            config.window_length
        );
        return Ok(PipelineOutput::empty(prices.len(), symbols.len()));
    }

    // Pass 1: per-window statistics
    let mut entropies = Vec::with_capacity(windows.len());
    let mut volatilities = Vec::with_capacity(windows.len());
    for window in &windows {
        let entropy = match config.entropy_estimator {
            EntropyEstimatorKind::Transition => transition_entropy(window.slice(&symbols))?,
            EntropyEstimatorKind::Bins => {
                binned_price_entropy(&prices[window.price_range()], config.bin_count)
            }
        };
        entropies.push(entropy);
        volatilities.push(estimate_volatility(
            config.volatility_estimator,
            prices,
            window,
            slicer.stride(),
        ));
    }

    // Pass 2: labels, which may depend on the whole run
    let classifier = ConditionClassifier::for_run(config.classifier, &volatilities);
    let conditions: Vec<_> = entropies
        .iter()
        .zip(&volatilities)
        .map(|(&entropy, &volatility)| classifier.classify(entropy, volatility))
        .collect();

    #[cfg(debug_assertions)]
    if DEBUG_FLAGS.print_window_details {
        for (window, ((entropy, volatility), condition)) in windows
            .iter()
            .zip(entropies.iter().zip(&volatilities).zip(&conditions))
        {
            log::info!(
                "Window {:>4} @ {:>6}: entropy {:.4} volatility {:.6} -> {}",
                window.index,
                window.start,
                entropy,
                volatility,
                condition
            );
        }
    }

    let records = build_summary_records(&entropies, &volatilities, &conditions)?;

    log::info!(
        "✅ Pipeline produced {} windows from {} prices ({} symbols, L={}, K={}, {:?} entropy)",
        records.len(),
        prices.len(),
        symbols.len(),
        config.window_length,
        config.stride,
        config.entropy_estimator
    );

    Ok(PipelineOutput {
        records,
        windows,
        price_count: prices.len(),
        symbol_count: symbols.len(),
    })
}

/// Same as [`run_pipeline`], taking time-stamped points in time order.
pub fn run_pipeline_on_points(
    points: &[PricePoint],
    config: &PipelineConfig,
) -> Result<PipelineOutput, PipelineError> {
    run_pipeline(&price_values(points), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClassifierPolicy, VolatilityEstimatorKind};
    use crate::domain::MarketCondition;

    fn config(window_length: usize, stride: usize) -> PipelineConfig {
        PipelineConfig {
            window_length,
            stride,
            ..Default::default()
        }
    }

    #[test]
    fn test_constant_prices_scenario() {
        let prices = [10.0; 5];
        let output = run_pipeline(&prices, &config(2, 1)).unwrap();

        assert_eq!(output.status(), RunStatus::Completed);
        assert_eq!(output.symbol_count, 4);
        assert_eq!(output.records.len(), 3);
        for (i, record) in output.records.iter().enumerate() {
            assert_eq!(record.window_id, i);
            assert_eq!(record.entropy, 0.0);
            assert_eq!(record.volatility, 0.0);
            assert_eq!(record.condition, MarketCondition::Bear);
        }

        for classifier in [
            ClassifierPolicy::MedianVolatility,
            ClassifierPolicy::Regime {
                entropy_split: 1.0,
                volatility_split: None,
            },
        ] {
            let cfg = PipelineConfig {
                classifier,
                ..config(2, 1)
            };
            let output = run_pipeline(&prices, &cfg).unwrap();
            assert!(
                output
                    .records
                    .iter()
                    .all(|r| r.condition == MarketCondition::Stable),
                "{:?}",
                classifier
            );
        }
    }

    #[test]
    fn test_alternating_prices_scenario() {
        let prices = [10.0, 11.0, 10.0, 11.0, 10.0, 11.0, 10.0, 11.0, 10.0];
        let output = run_pipeline(&prices, &config(4, 2)).unwrap();

        // 8 symbols, windows at 0, 2, 4
        assert_eq!(output.records.len(), 3);
        for record in &output.records {
            assert_eq!(record.entropy, 1.0);
            assert_eq!(record.condition, MarketCondition::Bull);
        }
    }

    #[test]
    fn test_single_symbol_window_of_one_hundred() {
        let prices: Vec<f64> = (0..101).map(|i| 100.0 + i as f64).collect();
        let output = run_pipeline(&prices, &config(100, 50)).unwrap();
        assert_eq!(output.records.len(), 1);
        assert_eq!(output.records[0].entropy, 0.0);
        // Steady +1 steps have no dispersion
        assert_eq!(output.records[0].volatility, 0.0);
    }

    #[test]
    fn test_too_short_input_is_not_an_error() {
        for prices in [vec![], vec![42.0]] {
            let output = run_pipeline(&prices, &config(2, 1)).unwrap();
            assert!(output.records.is_empty());
            assert_eq!(output.status(), RunStatus::InputTooShort);
        }
    }

    #[test]
    fn test_fewer_symbols_than_window_gives_no_windows() {
        let output = run_pipeline(&[1.0, 2.0, 3.0], &config(5, 1)).unwrap();
        assert!(output.records.is_empty());
        assert_eq!(output.symbol_count, 2);
        assert_eq!(output.status(), RunStatus::NoWindows);
    }

    #[test]
    fn test_invalid_config_fails_before_processing() {
        let result = run_pipeline(&[1.0, 2.0, 3.0], &config(0, 1));
        assert!(matches!(
            result,
            Err(PipelineError::InvalidConfiguration { .. })
        ));

        // Even with no usable input, a bad config is still reported
        let result = run_pipeline(&[], &config(2, 0));
        assert!(result.is_err());
    }

    #[test]
    fn test_non_finite_price_rejected() {
        let result = run_pipeline(&[1.0, f64::NAN, 3.0], &config(1, 1));
        assert!(matches!(
            result,
            Err(PipelineError::NonFinitePrice { index: 1, .. })
        ));
    }

    #[test]
    fn test_bins_estimator_stays_within_bounds() {
        let prices: Vec<f64> = (0..60).map(|i| ((i * 7) % 13) as f64).collect();
        let cfg = PipelineConfig {
            entropy_estimator: EntropyEstimatorKind::Bins,
            bin_count: 4,
            volatility_estimator: VolatilityEstimatorKind::TrailingLevel { trailing: 10 },
            ..config(10, 5)
        };
        let output = run_pipeline(&prices, &cfg).unwrap();
        assert_eq!(output.records.len(), (59 - 10) / 5 + 1);
        for record in &output.records {
            assert!(record.entropy >= 0.0 && record.entropy <= 2.0);
            assert!(record.volatility >= 0.0);
        }
    }

    #[test]
    fn test_points_and_values_agree() {
        let prices = [5.0, 6.0, 5.5, 5.5, 7.0, 6.0, 6.5];
        let points: Vec<PricePoint> = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| PricePoint::new(i as i64 * 60_000, p))
            .collect();
        let cfg = config(3, 1);
        assert_eq!(
            run_pipeline(&prices, &cfg).unwrap(),
            run_pipeline_on_points(&points, &cfg).unwrap()
        );
    }
}
