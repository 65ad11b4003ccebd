use std::ops::Range;

use crate::analysis::window::Window;
use crate::config::VolatilityEstimatorKind;
use crate::utils::maths_utils::{first_differences, sample_std_dev};

/// Price indices the volatility estimate for `window` is allowed to read.
///
/// - `StrideSpan`: `[start, start + 2 * stride)`, cut at the end of the series
/// - `WindowSpan`: the window's own price span `[start, start + length]`
/// - `TrailingLevel`: the last `trailing` prices up to and including the window's last price
pub fn price_span(
    kind: VolatilityEstimatorKind,
    window: &Window,
    stride: usize,
    price_count: usize,
) -> Range<usize> {
    let window_prices = window.price_range();
    let span = match kind {
        VolatilityEstimatorKind::StrideSpan => {
            window.start..window.start.saturating_add(stride.saturating_mul(2))
        }
        VolatilityEstimatorKind::WindowSpan => window_prices,
        VolatilityEstimatorKind::TrailingLevel { trailing } => {
            window_prices.end.saturating_sub(trailing)..window_prices.end
        }
    };
    span.start.min(price_count)..span.end.min(price_count)
}

/// Volatility of one window under the run's chosen policy. Always >= 0.
pub fn estimate_volatility(
    kind: VolatilityEstimatorKind,
    prices: &[f64],
    window: &Window,
    stride: usize,
) -> f64 {
    let span = &prices[price_span(kind, window, stride, prices.len())];
    match kind {
        VolatilityEstimatorKind::StrideSpan | VolatilityEstimatorKind::WindowSpan => {
            difference_volatility(span)
        }
        VolatilityEstimatorKind::TrailingLevel { .. } => level_volatility(span),
    }
}

/// Sample std dev of first differences. Needs at least two differences.
pub fn difference_volatility(prices: &[f64]) -> f64 {
    sample_std_dev(&first_differences(prices))
}

/// Sample std dev of the price levels themselves.
pub fn level_volatility(prices: &[f64]) -> f64 {
    sample_std_dev(prices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(index: usize, start: usize, length: usize) -> Window {
        Window {
            index,
            start,
            length,
        }
    }

    #[test]
    fn test_constant_prices_are_zero_for_every_policy() {
        let prices = vec![10.0; 30];
        let w = window(2, 10, 8);
        for kind in [
            VolatilityEstimatorKind::StrideSpan,
            VolatilityEstimatorKind::WindowSpan,
            VolatilityEstimatorKind::TrailingLevel { trailing: 5 },
        ] {
            assert_eq!(estimate_volatility(kind, &prices, &w, 5), 0.0, "{:?}", kind);
        }
    }

    #[test]
    fn test_spans() {
        let w = window(1, 4, 4);
        assert_eq!(
            price_span(VolatilityEstimatorKind::StrideSpan, &w, 4, 100),
            4..12
        );
        assert_eq!(
            price_span(VolatilityEstimatorKind::WindowSpan, &w, 4, 100),
            4..9
        );
        assert_eq!(
            price_span(
                VolatilityEstimatorKind::TrailingLevel { trailing: 3 },
                &w,
                4,
                100
            ),
            6..9
        );
        // Trailing length longer than the history clamps at the series start
        assert_eq!(
            price_span(
                VolatilityEstimatorKind::TrailingLevel { trailing: 50 },
                &w,
                4,
                100
            ),
            0..9
        );
    }

    #[test]
    fn test_stride_span_is_cut_at_series_end() {
        let w = window(3, 6, 2);
        assert_eq!(
            price_span(VolatilityEstimatorKind::StrideSpan, &w, 2, 9),
            6..9
        );
        assert_eq!(
            price_span(VolatilityEstimatorKind::StrideSpan, &w, 5, 9),
            6..9
        );
    }

    #[test]
    fn test_difference_volatility() {
        // Differences +1, -1, +1, -1: sample std dev of [1, -1, 1, -1] = sqrt(4/3)
        let prices = [10.0, 11.0, 10.0, 11.0, 10.0];
        let v = difference_volatility(&prices);
        assert!((v - (4.0f64 / 3.0).sqrt()).abs() < 1e-12);

        // A steady trend has identical differences, hence zero dispersion
        assert_eq!(difference_volatility(&[1.0, 2.0, 3.0, 4.0]), 0.0);
    }

    #[test]
    fn test_too_few_differences_is_zero() {
        assert_eq!(difference_volatility(&[]), 0.0);
        assert_eq!(difference_volatility(&[5.0]), 0.0);
        assert_eq!(difference_volatility(&[5.0, 9.0]), 0.0);
        assert_eq!(level_volatility(&[5.0]), 0.0);
    }

    #[test]
    fn test_level_volatility() {
        let v = level_volatility(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        // Sample variance 32 / 7
        assert!((v - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }
}
