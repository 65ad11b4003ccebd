// Presentation of a record run: statistics, text summary and chart data
pub mod chart_data;
pub mod stats;
pub mod summary_panel;

pub use chart_data::{ChartData, ChartField};
pub use stats::{TrendLine, interpret_correlation, pearson_correlation};
pub use summary_panel::{ConditionSummary, render_summary_panel, summarize_conditions};

use crate::models::summary_record::{entropies, volatilities};
use crate::models::SummaryRecord;

/// Correlation block printed after a run
pub fn render_correlation(records: &[SummaryRecord]) -> String {
    let xs = entropies(records);
    let ys = volatilities(records);
    let mut text = String::from("Correlation Analysis:\n");
    match pearson_correlation(&xs, &ys) {
        Some(r) => {
            text.push_str(&format!("Entropy-Volatility Correlation: {:.3}\n", r));
            text.push_str(&format!(
                "Interpretation: {} correlation\n",
                interpret_correlation(r)
            ));
        }
        None => text.push_str(
            "Entropy-Volatility Correlation: undefined (fewer than 2 windows or no spread)\n",
        ),
    }
    if let Some(line) = TrendLine::fit(&xs, &ys) {
        text.push_str(&format!("Trend: {}\n", line));
    }
    text
}

/// Full text report: correlation then the per-condition panel
pub fn render_report(records: &[SummaryRecord]) -> String {
    format!(
        "{}\n{}",
        render_correlation(records),
        render_summary_panel(&summarize_conditions(records))
    )
}
