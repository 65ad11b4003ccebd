use crate::analysis::PipelineError;
use crate::config::ClassifierPolicy;
use crate::domain::MarketCondition;
use crate::utils::maths_utils::median;

/// Labels windows under one policy. Built once per run so median-based splits see every
/// window's volatility before the first label is handed out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConditionClassifier {
    policy: ClassifierPolicy,
    // Run median of volatility, only present for policies that split on it
    volatility_split: Option<f64>,
}

impl ConditionClassifier {
    pub fn for_run(policy: ClassifierPolicy, volatilities: &[f64]) -> Self {
        let volatility_split = match policy {
            ClassifierPolicy::EntropyThreshold { .. } => None,
            ClassifierPolicy::MedianVolatility => median(volatilities),
            ClassifierPolicy::Regime {
                volatility_split: Some(fixed),
                ..
            } => Some(fixed),
            ClassifierPolicy::Regime {
                volatility_split: None,
                ..
            } => median(volatilities),
        };
        Self {
            policy,
            volatility_split,
        }
    }

    pub fn policy(&self) -> ClassifierPolicy {
        self.policy
    }

    /// The volatility split point in force for this run, if the policy uses one
    pub fn volatility_split(&self) -> Option<f64> {
        self.volatility_split
    }

    pub fn classify(&self, entropy: f64, volatility: f64) -> MarketCondition {
        match self.policy {
            ClassifierPolicy::EntropyThreshold {
                bear_below,
                bull_below,
            } => classify_entropy(entropy, bear_below, bull_below),
            ClassifierPolicy::MedianVolatility => {
                // No windows means no median, and nothing to classify anyway
                let split = self.volatility_split.unwrap_or(f64::INFINITY);
                if volatility > split {
                    MarketCondition::HighVolatility
                } else {
                    MarketCondition::Stable
                }
            }
            ClassifierPolicy::Regime { entropy_split, .. } => {
                let split = self.volatility_split.unwrap_or(f64::INFINITY);
                let high_entropy = entropy >= entropy_split;
                let high_volatility = volatility >= split;
                match (high_entropy, high_volatility) {
                    (false, false) => MarketCondition::Stable,
                    (false, true) => MarketCondition::Panic,
                    (true, true) => MarketCondition::Chaotic,
                    (true, false) => MarketCondition::Choppy,
                }
            }
        }
    }
}

/// Entropy-only rule. The tighter threshold is checked first so every label is reachable.
pub fn classify_entropy(entropy: f64, bear_below: f64, bull_below: f64) -> MarketCondition {
    if entropy < bear_below {
        MarketCondition::Bear
    } else if entropy < bull_below {
        MarketCondition::Bull
    } else {
        MarketCondition::Mixed
    }
}

/// Two-pass classification of a whole run.
pub fn classify_all(
    policy: ClassifierPolicy,
    entropies: &[f64],
    volatilities: &[f64],
) -> Result<Vec<MarketCondition>, PipelineError> {
    if entropies.len() != volatilities.len() {
        return Err(PipelineError::MisalignedSequences {
            entropy_len: entropies.len(),
            volatility_len: volatilities.len(),
            condition_len: 0,
        });
    }
    let classifier = ConditionClassifier::for_run(policy, volatilities);
    Ok(entropies
        .iter()
        .zip(volatilities)
        .map(|(&entropy, &volatility)| classifier.classify(entropy, volatility))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_thresholds() -> ClassifierPolicy {
        ClassifierPolicy::EntropyThreshold {
            bear_below: 0.5,
            bull_below: 1.2,
        }
    }

    #[test]
    fn test_entropy_threshold_bands() {
        assert_eq!(classify_entropy(0.0, 0.5, 1.2), MarketCondition::Bear);
        assert_eq!(classify_entropy(0.49, 0.5, 1.2), MarketCondition::Bear);
        assert_eq!(classify_entropy(0.5, 0.5, 1.2), MarketCondition::Bull);
        assert_eq!(classify_entropy(1.19, 0.5, 1.2), MarketCondition::Bull);
        assert_eq!(classify_entropy(1.2, 0.5, 1.2), MarketCondition::Mixed);
        assert_eq!(classify_entropy(1.58, 0.5, 1.2), MarketCondition::Mixed);
    }

    #[test]
    fn test_entropy_threshold_ignores_volatility() {
        let classifier = ConditionClassifier::for_run(default_thresholds(), &[1.0, 50.0]);
        assert_eq!(classifier.volatility_split(), None);
        assert_eq!(classifier.classify(0.3, 0.0), classifier.classify(0.3, 1e6));
    }

    #[test]
    fn test_median_split_uses_the_whole_run() {
        let vols = [1.0, 5.0, 2.0, 8.0, 3.0];
        let labels = classify_all(ClassifierPolicy::MedianVolatility, &[0.0; 5], &vols).unwrap();
        // Median is 3.0; equal to the median stays Stable
        assert_eq!(
            labels,
            vec![
                MarketCondition::Stable,
                MarketCondition::HighVolatility,
                MarketCondition::Stable,
                MarketCondition::HighVolatility,
                MarketCondition::Stable,
            ]
        );
    }

    #[test]
    fn test_median_split_constant_volatility_is_stable() {
        let labels = classify_all(ClassifierPolicy::MedianVolatility, &[1.0; 4], &[0.0; 4]).unwrap();
        assert!(labels.iter().all(|&c| c == MarketCondition::Stable));
    }

    #[test]
    fn test_regime_quadrants() {
        let policy = ClassifierPolicy::Regime {
            entropy_split: 1.0,
            volatility_split: Some(2.0),
        };
        let classifier = ConditionClassifier::for_run(policy, &[]);
        assert_eq!(classifier.classify(0.2, 0.5), MarketCondition::Stable);
        assert_eq!(classifier.classify(0.2, 3.0), MarketCondition::Panic);
        assert_eq!(classifier.classify(1.4, 3.0), MarketCondition::Chaotic);
        assert_eq!(classifier.classify(1.4, 0.5), MarketCondition::Choppy);
        // Splits are inclusive on the high side
        assert_eq!(classifier.classify(1.0, 2.0), MarketCondition::Chaotic);
    }

    #[test]
    fn test_regime_without_fixed_split_uses_median() {
        let policy = ClassifierPolicy::Regime {
            entropy_split: 1.0,
            volatility_split: None,
        };
        let classifier = ConditionClassifier::for_run(policy, &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(classifier.volatility_split(), Some(2.5));
        assert_eq!(classifier.classify(0.0, 2.0), MarketCondition::Stable);
        assert_eq!(classifier.classify(0.0, 2.5), MarketCondition::Panic);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let entropies = [0.1, 0.9, 1.4, 0.0, 1.1];
        let vols = [0.3, 0.1, 0.9, 0.0, 0.4];
        for policy in [
            default_thresholds(),
            ClassifierPolicy::MedianVolatility,
            ClassifierPolicy::Regime {
                entropy_split: 1.0,
                volatility_split: None,
            },
        ] {
            let first = classify_all(policy, &entropies, &vols).unwrap();
            let second = classify_all(policy, &entropies, &vols).unwrap();
            assert_eq!(first, second, "{:?}", policy);
        }
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let result = classify_all(default_thresholds(), &[0.1, 0.2], &[0.3]);
        assert!(matches!(
            result,
            Err(PipelineError::MisalignedSequences {
                entropy_len: 2,
                volatility_len: 1,
                ..
            })
        ));
    }
}
