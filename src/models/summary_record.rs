use serde::{Deserialize, Serialize};

use crate::domain::MarketCondition;

/// Column names of the persisted record table, in order
pub const RECORD_HEADER: [&str; 4] = ["Window_ID", "Entropy", "Volatility", "Market_Condition"];

/// One row of pipeline output. One per window, in window order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SummaryRecord {
    #[serde(rename = "Window_ID")]
    pub window_id: usize,
    #[serde(rename = "Entropy")]
    pub entropy: f64,
    #[serde(rename = "Volatility")]
    pub volatility: f64,
    #[serde(rename = "Market_Condition")]
    pub condition: MarketCondition,
}

impl SummaryRecord {
    pub fn new(
        window_id: usize,
        entropy: f64,
        volatility: f64,
        condition: MarketCondition,
    ) -> Self {
        SummaryRecord {
            window_id,
            entropy,
            volatility,
            condition,
        }
    }
}

/// Pull one column out of a record run, keeping order
pub fn entropies(records: &[SummaryRecord]) -> Vec<f64> {
    records.iter().map(|r| r.entropy).collect()
}

pub fn volatilities(records: &[SummaryRecord]) -> Vec<f64> {
    records.iter().map(|r| r.volatility).collect()
}
