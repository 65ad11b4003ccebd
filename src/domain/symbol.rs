use serde::{Deserialize, Serialize};
use strum::EnumCount;

/// Direction of one price transition.
///
/// The numeric codes are fixed: `Flat = 0`, `Up = 1`, `Down = 2`.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Serialize,
    Deserialize,
    strum_macros::EnumIter,
    strum_macros::EnumCount,
    strum_macros::Display,
)]
pub enum Symbol {
    Flat,
    Up,
    Down,
}

impl Symbol {
    pub const ALPHABET_SIZE: usize = Symbol::COUNT;

    pub fn code(self) -> usize {
        match self {
            Symbol::Flat => 0,
            Symbol::Up => 1,
            Symbol::Down => 2,
        }
    }

    /// Symbol for the move from `previous` to `next`.
    pub fn from_transition(previous: f64, next: f64) -> Self {
        if next < previous {
            Symbol::Down
        } else if next > previous {
            Symbol::Up
        } else {
            Symbol::Flat
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_codes_are_dense_and_unique() {
        let codes: Vec<usize> = Symbol::iter().map(Symbol::code).collect();
        assert_eq!(codes, vec![0, 1, 2]);
        assert_eq!(Symbol::ALPHABET_SIZE, 3);
    }

    #[test]
    fn test_from_transition() {
        assert_eq!(Symbol::from_transition(10.0, 9.5), Symbol::Down);
        assert_eq!(Symbol::from_transition(10.0, 10.5), Symbol::Up);
        assert_eq!(Symbol::from_transition(10.0, 10.0), Symbol::Flat);
    }
}
