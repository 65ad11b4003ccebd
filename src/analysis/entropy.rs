//! Shannon entropy estimators, in bits.
//!
//! | Variant | Input | Alphabet | Range |
//! |---------|-------|----------|-------|
//! | Transition | Up/Down/Flat symbols of one window | 3 | [0, log2 3] |
//! | Bins | raw prices of the window's span | `bin_count` equal-width buckets | [0, log2 bin_count] |

use crate::analysis::PipelineError;
use crate::domain::Symbol;
use crate::utils::maths_utils::RangeF64;

/// Added inside `log2` by the bucket variant so a bucket probability can never hit `log2(0)`
pub const BIN_PROBABILITY_EPSILON: f64 = 1e-10;

/// Upper bound of Shannon entropy for an alphabet of `alphabet_size` symbols
pub fn max_entropy(alphabet_size: usize) -> f64 {
    if alphabet_size <= 1 {
        0.0
    } else {
        (alphabet_size as f64).log2()
    }
}

/// Entropy of the symbol distribution inside one window.
///
/// H = -Σ p(s) * log2(p(s)) over every symbol present in the window. Symbols that never
/// occur contribute nothing. An empty window is a caller error.
pub fn transition_entropy(window: &[Symbol]) -> Result<f64, PipelineError> {
    if window.is_empty() {
        return Err(PipelineError::EmptyWindow);
    }

    let mut counts = [0usize; Symbol::ALPHABET_SIZE];
    for symbol in window {
        counts[symbol.code()] += 1;
    }

    let total = window.len() as f64;
    let mut entropy = 0.0;
    for &count in &counts {
        if count > 0 {
            let p = count as f64 / total;
            entropy -= p * p.log2();
        }
    }

    Ok(entropy.clamp(0.0, max_entropy(Symbol::ALPHABET_SIZE)))
}

/// Entropy of raw prices dropped into `bin_count` equal-width buckets spanning
/// the window's own [min, max].
///
/// Fewer than two prices, or a window with no price movement, gives 0.
pub fn binned_price_entropy(prices: &[f64], bin_count: usize) -> f64 {
    if prices.len() < 2 || bin_count < 1 {
        return 0.0;
    }

    let range = RangeF64::spanning(prices, bin_count);
    if range.range_length() < f64::EPSILON {
        // All prices identical - zero entropy
        return 0.0;
    }

    let mut bins = vec![0usize; range.n_chunks()];
    for &price in prices {
        bins[range.chunk_index(price)] += 1;
    }

    let total = prices.len() as f64;
    let mut entropy = 0.0;
    for &count in &bins {
        if count > 0 {
            let p = count as f64 / total;
            entropy -= p * (p + BIN_PROBABILITY_EPSILON).log2();
        }
    }

    entropy.clamp(0.0, max_entropy(bin_count))
}
