//! Renderer-agnostic chart description.
//!
//! One JSON document holds everything needed to draw the scatter (with trend line), the
//! per-window time series for whichever fields were asked for, and the label regions.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::MarketCondition;
use crate::models::SummaryRecord;
use crate::models::summary_record::{entropies, volatilities};
use crate::report::stats::{TrendLine, interpret_correlation, pearson_correlation};
use crate::report::summary_panel::summarize_conditions;
use crate::utils::maths_utils::get_min_max;

/// A record column that can be drawn as a time series
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChartField {
    Entropy,
    Volatility,
}

impl ChartField {
    pub fn axis_label(&self) -> &'static str {
        match self {
            ChartField::Entropy => "Shannon Entropy (bits)",
            ChartField::Volatility => "Market Volatility",
        }
    }

    pub fn value(&self, record: &SummaryRecord) -> f64 {
        match self {
            ChartField::Entropy => record.entropy,
            ChartField::Volatility => record.volatility,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub window_id: usize,
    pub entropy: f64,
    pub volatility: f64,
    pub condition: MarketCondition,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TimeSeriesChart {
    pub field: ChartField,
    pub y_label: String,
    /// (window_id, value) in window order
    pub points: Vec<(usize, f64)>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConditionSpan {
    pub condition: MarketCondition,
    pub first_window: usize,
    pub last_window: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChartData {
    pub title: String,
    pub correlation: Option<f64>,
    pub correlation_interpretation: Option<String>,
    pub trend: Option<TrendLine>,
    /// Trend line evaluated at the smallest and largest entropy
    pub trend_points: Vec<(f64, f64)>,
    pub scatter: Vec<ScatterPoint>,
    pub series: Vec<TimeSeriesChart>,
    pub condition_spans: Vec<ConditionSpan>,
}

impl ChartData {
    pub fn build(records: &[SummaryRecord], fields: &[ChartField]) -> Self {
        let entropies = entropies(records);
        let volatilities = volatilities(records);

        let correlation = pearson_correlation(&entropies, &volatilities);
        let trend = TrendLine::fit(&entropies, &volatilities);
        let trend_points = match trend {
            Some(line) if !entropies.is_empty() => {
                let (lo, hi) = get_min_max(&entropies);
                vec![(lo, line.at(lo)), (hi, line.at(hi))]
            }
            _ => Vec::new(),
        };

        let scatter = records
            .iter()
            .map(|r| ScatterPoint {
                window_id: r.window_id,
                entropy: r.entropy,
                volatility: r.volatility,
                condition: r.condition,
            })
            .collect();

        let series = fields
            .iter()
            .map(|&field| TimeSeriesChart {
                field,
                y_label: field.axis_label().to_string(),
                points: records
                    .iter()
                    .map(|r| (r.window_id, field.value(r)))
                    .collect(),
            })
            .collect();

        let condition_spans = summarize_conditions(records)
            .into_iter()
            .map(|s| ConditionSpan {
                condition: s.condition,
                first_window: s.first_window,
                last_window: s.last_window,
            })
            .collect();

        ChartData {
            title: "Shannon Entropy vs Market Volatility Analysis".to_string(),
            correlation,
            correlation_interpretation: correlation
                .map(|r| format!("{} correlation", interpret_correlation(r))),
            trend,
            trend_points,
            scatter,
            series,
            condition_spans,
        }
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self).context("Failed to serialize chart data")
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create directory: {}", parent.display()))?;
        }
        let file = File::create(path).context(format!("Failed to create file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        self.write_json(&mut writer)?;
        writer
            .flush()
            .context(format!("Failed to flush chart data to: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<SummaryRecord> {
        vec![
            SummaryRecord::new(0, 0.0, 1.0, MarketCondition::Bear),
            SummaryRecord::new(1, 1.0, 3.0, MarketCondition::Bull),
            SummaryRecord::new(2, 1.5, 4.0, MarketCondition::Mixed),
        ]
    }

    #[test]
    fn test_only_selected_series_are_built() {
        let chart = ChartData::build(&records(), &[ChartField::Volatility]);
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].field, ChartField::Volatility);
        assert_eq!(chart.series[0].points, vec![(0, 1.0), (1, 3.0), (2, 4.0)]);
        assert_eq!(chart.scatter.len(), 3);
        assert_eq!(chart.condition_spans.len(), 3);
    }

    #[test]
    fn test_trend_and_correlation_present() {
        let chart = ChartData::build(&records(), &[ChartField::Entropy, ChartField::Volatility]);
        assert!(chart.correlation.unwrap() > 0.9);
        assert_eq!(
            chart.correlation_interpretation.as_deref(),
            Some("Strong positive correlation")
        );
        assert_eq!(chart.trend_points.len(), 2);
        assert_eq!(chart.trend_points[0].0, 0.0);
        assert_eq!(chart.trend_points[1].0, 1.5);
    }

    #[test]
    fn test_json_uses_field_names() {
        let chart = ChartData::build(&records(), &[ChartField::Entropy]);
        let mut buffer = Vec::new();
        chart.write_json(&mut buffer).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["series"][0]["field"], "entropy");
        assert_eq!(value["scatter"][1]["condition"], "Bull");
    }

    #[test]
    fn test_empty_records() {
        let chart = ChartData::build(&[], &[ChartField::Entropy]);
        assert_eq!(chart.correlation, None);
        assert!(chart.trend_points.is_empty());
        assert!(chart.series[0].points.is_empty());
    }
}
