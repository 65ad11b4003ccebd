use std::collections::BTreeMap;
use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::domain::MarketCondition;
use crate::models::SummaryRecord;
use crate::utils::maths_utils::{mean, median};

/// Entropy (bits) separating "High entropy" from "Low entropy" in the pattern text
pub const PATTERN_ENTROPY_SPLIT: f64 = 1.0;

/// Aggregates for every window that received one label.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConditionSummary {
    pub condition: MarketCondition,
    pub count: usize,
    pub avg_entropy: f64,
    pub avg_volatility: f64,
    pub first_window: usize,
    pub last_window: usize,
    pub pattern: String,
}

/// One summary per label present, in label order. Volatility is called high or low
/// against the median of the whole run.
pub fn summarize_conditions(records: &[SummaryRecord]) -> Vec<ConditionSummary> {
    let all_volatilities: Vec<f64> = records.iter().map(|r| r.volatility).collect();
    let Some(volatility_split) = median(&all_volatilities) else {
        return Vec::new();
    };

    let mut groups: BTreeMap<MarketCondition, Vec<&SummaryRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.condition).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(condition, group)| {
            let entropies: Vec<f64> = group.iter().map(|r| r.entropy).collect();
            let volatilities: Vec<f64> = group.iter().map(|r| r.volatility).collect();
            let avg_entropy = mean(&entropies).unwrap_or(0.0);
            let avg_volatility = mean(&volatilities).unwrap_or(0.0);
            ConditionSummary {
                condition,
                count: group.len(),
                avg_entropy,
                avg_volatility,
                first_window: group.iter().map(|r| r.window_id).min().unwrap_or(0),
                last_window: group.iter().map(|r| r.window_id).max().unwrap_or(0),
                pattern: behavior_pattern(avg_entropy, avg_volatility, volatility_split),
            }
        })
        .collect()
}

pub fn behavior_pattern(avg_entropy: f64, avg_volatility: f64, volatility_split: f64) -> String {
    let entropy = if avg_entropy > PATTERN_ENTROPY_SPLIT {
        "High entropy"
    } else {
        "Low entropy"
    };
    let volatility = if avg_volatility > volatility_split {
        "High volatility"
    } else {
        "Low volatility"
    };
    format!("{} + {}", entropy, volatility)
}

/// Text block listing each label's aggregates
pub fn render_summary_panel(summaries: &[ConditionSummary]) -> String {
    let mut text = String::from("Market Condition Analysis:\n\n");
    if summaries.is_empty() {
        text.push_str("(no windows)\n");
    }
    for summary in summaries {
        // Writing to a String cannot fail
        let _ = writeln!(text, "{} ({} windows):", summary.condition, summary.count);
        let _ = writeln!(text, "  Avg Entropy: {:.3} bits", summary.avg_entropy);
        let _ = writeln!(text, "  Avg Volatility: {:.2}", summary.avg_volatility);
        let _ = writeln!(text, "  Pattern: {}\n", summary.pattern);
    }
    text
}
