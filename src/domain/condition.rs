use serde::{Deserialize, Serialize};

/// Coarse label attached to each window. The `Display` text is the value written to the
/// `Market_Condition` column, so it must not change.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Debug,
    Serialize,
    Deserialize,
    strum_macros::EnumIter,
    strum_macros::EnumString,
    strum_macros::Display,
)]
pub enum MarketCondition {
    // Entropy-threshold policy
    Bull,
    Bear,
    Mixed,
    // Median-volatility policy
    Stable,
    HighVolatility,
    // Regime quadrants (Stable doubles as low entropy + low volatility)
    Panic,
    Chaotic,
    Choppy,
}
