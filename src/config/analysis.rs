//! Analysis and computation configuration

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::analysis::PipelineError;

/// Sliding window geometry, in symbols
pub struct WindowSettings {
    pub length: usize,
    pub stride: usize,
}

/// Settings for the bucket-discretization entropy variant
pub struct BinSettings {
    pub bin_count: usize,
}

/// Settings for the level-based volatility variant
pub struct VolatilitySettings {
    // Number of trailing prices used by `TrailingLevel`
    pub trailing_length: usize,
}

/// Thresholds used by the classification policies
pub struct ClassifierSettings {
    // Entropy (bits) below which a window is labelled Bear
    pub bear_below: f64,
    // Entropy (bits) below which a window is labelled Bull (checked after bear_below)
    pub bull_below: f64,
    // Entropy split for the regime quadrants
    pub regime_entropy_split: f64,
}

/// The Master Analysis Configuration
pub struct AnalysisConfig {
    pub window: WindowSettings,
    pub bins: BinSettings,
    pub volatility: VolatilitySettings,
    pub classifier: ClassifierSettings,
}

pub const ANALYSIS: AnalysisConfig = AnalysisConfig {
    window: WindowSettings {
        length: 100,
        stride: 50,
    },
    bins: BinSettings { bin_count: 4 },
    volatility: VolatilitySettings {
        trailing_length: 20,
    },
    classifier: ClassifierSettings {
        bear_below: 0.5,
        bull_below: 1.2,
        regime_entropy_split: 1.0,
    },
};

/// Which randomness estimator runs over each window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EntropyEstimatorKind {
    /// Shannon entropy of the Up/Down/Flat transition symbols
    #[default]
    Transition,
    /// Shannon entropy of prices dropped into equal-width buckets
    Bins,
}

/// Which dispersion estimator runs alongside each window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum VolatilityEstimatorKind {
    /// Std dev of price differences over two strides from the window start
    #[default]
    StrideSpan,
    /// Std dev of price differences over exactly the window's price span
    WindowSpan,
    /// Std dev of raw price levels over `trailing` prices ending at the window's last price
    TrailingLevel { trailing: usize },
}

/// How an (entropy, volatility) pair becomes a label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum ClassifierPolicy {
    /// entropy < bear_below -> Bear, entropy < bull_below -> Bull, otherwise Mixed
    EntropyThreshold { bear_below: f64, bull_below: f64 },
    /// volatility above the run's median -> HighVolatility, otherwise Stable
    MedianVolatility,
    /// Entropy x volatility quadrants. `volatility_split: None` splits on the run's median.
    Regime {
        entropy_split: f64,
        volatility_split: Option<f64>,
    },
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        ClassifierPolicy::EntropyThreshold {
            bear_below: ANALYSIS.classifier.bear_below,
            bull_below: ANALYSIS.classifier.bull_below,
        }
    }
}

/// Which column of the fetched series is fed to the pipeline.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "lowercase")]
pub enum PriceField {
    Open,
    High,
    Low,
    #[default]
    Close,
}

/// Everything the pipeline needs, passed in explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub window_length: usize,
    pub stride: usize,
    pub bin_count: usize,
    pub entropy_estimator: EntropyEstimatorKind,
    pub volatility_estimator: VolatilityEstimatorKind,
    pub classifier: ClassifierPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_length: ANALYSIS.window.length,
            stride: ANALYSIS.window.stride,
            bin_count: ANALYSIS.bins.bin_count,
            entropy_estimator: EntropyEstimatorKind::default(),
            volatility_estimator: VolatilityEstimatorKind::default(),
            classifier: ClassifierPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Reject anything that would make the run meaningless. Called before any processing.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.window_length == 0 {
            return Err(PipelineError::invalid("window_length must be > 0"));
        }
        if self.stride == 0 {
            return Err(PipelineError::invalid("stride must be > 0"));
        }
        if self.bin_count < 1 {
            return Err(PipelineError::invalid("bin_count must be >= 1"));
        }
        if let VolatilityEstimatorKind::TrailingLevel { trailing } = self.volatility_estimator {
            if trailing == 0 {
                return Err(PipelineError::invalid("trailing volatility length must be > 0"));
            }
        }
        match self.classifier {
            ClassifierPolicy::EntropyThreshold {
                bear_below,
                bull_below,
            } => {
                if !bear_below.is_finite() || !bull_below.is_finite() {
                    return Err(PipelineError::invalid("entropy thresholds must be finite"));
                }
                if bear_below < 0.0 || bull_below < 0.0 {
                    return Err(PipelineError::invalid("entropy thresholds must be >= 0"));
                }
                if bear_below > bull_below {
                    return Err(PipelineError::invalid(format!(
                        "bear_below ({}) must not exceed bull_below ({})",
                        bear_below, bull_below
                    )));
                }
            }
            ClassifierPolicy::MedianVolatility => {}
            ClassifierPolicy::Regime {
                entropy_split,
                volatility_split,
            } => {
                if !entropy_split.is_finite() || entropy_split < 0.0 {
                    return Err(PipelineError::invalid(
                        "regime entropy_split must be finite and >= 0",
                    ));
                }
                if let Some(split) = volatility_split {
                    if !split.is_finite() || split < 0.0 {
                        return Err(PipelineError::invalid(
                            "regime volatility_split must be finite and >= 0",
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Number of distinct symbols the active entropy estimator can see.
    pub fn alphabet_size(&self) -> usize {
        match self.entropy_estimator {
            EntropyEstimatorKind::Transition => crate::domain::Symbol::ALPHABET_SIZE,
            EntropyEstimatorKind::Bins => self.bin_count,
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let reader = BufReader::new(file);
        let config: PipelineConfig = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }
}
