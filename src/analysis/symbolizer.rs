use itertools::Itertools;

use crate::domain::Symbol;

/// One symbol per adjacent price pair, so `n` prices give `n - 1` symbols
/// (and fewer than two prices give none).
pub fn symbolize(prices: &[f64]) -> Vec<Symbol> {
    prices
        .iter()
        .tuple_windows()
        .map(|(&previous, &next)| Symbol::from_transition(previous, next))
        .collect()
}
