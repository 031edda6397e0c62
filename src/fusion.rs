//! Fusion Decision Engine
//!
//! Combines the rule verdict with the classifier probability. Rules can only
//! push a message towards phishing; once they have fired, the classifier is
//! held to the lower adaptive threshold.

use crate::config::FusionConfig;
use crate::rule_engine::RuleVerdict;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub verdict: bool,
    pub reasons: Vec<String>,
    pub classifier_probability: f64,
    pub active_threshold: f64,
}

pub struct DecisionEngine {
    config: FusionConfig,
}

impl DecisionEngine {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    /// Make the final decision for one message.
    pub fn decide(
        &self,
        rule_verdict: &RuleVerdict,
        classifier_probability: f64,
    ) -> DetectionResult {
        let probability = sanitize_probability(classifier_probability);

        let mut reasons = rule_verdict.reasons.clone();
        if probability > 0.0 {
            reasons.push(format!("ML probability (phishing): {:.2}", probability));
        }

        let active_threshold = self.active_threshold(rule_verdict);
        let verdict = rule_verdict.is_suspicious || probability >= active_threshold;

        log::debug!(
            "Fusion: rules={} p={:.4} threshold={} -> verdict={}",
            rule_verdict.is_suspicious,
            probability,
            active_threshold,
            verdict
        );

        DetectionResult {
            verdict,
            reasons,
            classifier_probability: probability,
            active_threshold,
        }
    }

    /// Threshold the classifier must reach for this rule outcome.
    pub fn active_threshold(&self, rule_verdict: &RuleVerdict) -> f64 {
        if rule_verdict.is_suspicious {
            self.config.adaptive_threshold
        } else {
            self.config.base_threshold
        }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(FusionConfig::default())
    }
}

/// NaN becomes 0.0; everything else is clamped into `[0, 1]`.
fn sanitize_probability(probability: f64) -> f64 {
    if probability.is_nan() {
        0.0
    } else {
        probability.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean() -> RuleVerdict {
        RuleVerdict::from_reasons(Vec::new())
    }

    fn flagged() -> RuleVerdict {
        RuleVerdict::from_reasons(vec!["Suspicious word found: 'urgent'".to_string()])
    }

    #[test]
    fn test_adaptive_threshold() {
        let engine = DecisionEngine::default();

        let result = engine.decide(&clean(), 0.3);
        assert!(!result.verdict);
        assert_eq!(result.active_threshold, 0.5);

        let result = engine.decide(&flagged(), 0.3);
        assert!(result.verdict);
        assert_eq!(result.active_threshold, 0.25);
    }

    #[test]
    fn test_base_threshold_is_inclusive() {
        let engine = DecisionEngine::default();
        assert!(engine.decide(&clean(), 0.5).verdict);
        assert!(!engine.decide(&clean(), 0.4999).verdict);
    }

    #[test]
    fn test_rules_force_positive() {
        let engine = DecisionEngine::default();
        for p in [0.0, 0.1, 0.24, 0.9] {
            assert!(engine.decide(&flagged(), p).verdict);
        }
    }

    #[test]
    fn test_probability_annotation() {
        let engine = DecisionEngine::default();

        let result = engine.decide(&flagged(), 0.0);
        assert_eq!(result.reasons, flagged().reasons);

        let result = engine.decide(&flagged(), 0.876);
        assert_eq!(
            result.reasons,
            vec![
                "Suspicious word found: 'urgent'".to_string(),
                "ML probability (phishing): 0.88".to_string(),
            ]
        );

        let result = engine.decide(&clean(), 0.1);
        assert!(!result.verdict);
        assert_eq!(result.reasons, vec!["ML probability (phishing): 0.10"]);
    }

    #[test]
    fn test_out_of_range_probabilities() {
        let engine = DecisionEngine::default();

        let result = engine.decide(&clean(), f64::NAN);
        assert!(!result.verdict);
        assert!(result.reasons.is_empty());
        assert_eq!(result.classifier_probability, 0.0);

        let result = engine.decide(&clean(), 1.7);
        assert!(result.verdict);
        assert_eq!(result.classifier_probability, 1.0);

        let result = engine.decide(&clean(), -0.2);
        assert!(!result.verdict);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn test_custom_thresholds() {
        let engine = DecisionEngine::new(FusionConfig {
            base_threshold: 0.8,
            adaptive_threshold: 0.8,
        });
        assert!(!engine.decide(&clean(), 0.7).verdict);
        assert!(engine.decide(&clean(), 0.8).verdict);
        assert_eq!(engine.config().base_threshold, 0.8);
    }
}
