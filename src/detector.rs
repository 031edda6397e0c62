use crate::classifier::{
    compose_text, load_classifier, ClassifierError, ClassifierStatus, NullClassifier,
    PhishingClassifier,
};
use crate::config::Config;
use crate::fusion::{DecisionEngine, DetectionResult};
use crate::message::EmailMessage;
use crate::rule_engine::RuleEngine;
use serde::{Deserialize, Serialize};

/// Verdict for one message plus the classifier state it was produced under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    #[serde(flatten)]
    pub result: DetectionResult,
    pub classifier: ClassifierStatus,
}

impl DetectionReport {
    pub fn warning(&self) -> Option<String> {
        self.classifier.warning()
    }
}

/// Rules, classifier and fusion wired together. Immutable after construction,
/// so one instance can serve many threads.
pub struct PhishingDetector {
    rules: RuleEngine,
    classifier: Box<dyn PhishingClassifier>,
    status: ClassifierStatus,
    decision: DecisionEngine,
    include_sender: bool,
}

impl PhishingDetector {
    /// Build from configuration, loading the model per `config.classifier.mode`.
    pub fn from_config(config: &Config) -> Result<Self, ClassifierError> {
        let (classifier, status) = load_classifier(&config.classifier)?;
        Ok(Self::with_classifier(config, classifier, status))
    }

    pub fn with_classifier(
        config: &Config,
        classifier: Box<dyn PhishingClassifier>,
        status: ClassifierStatus,
    ) -> Self {
        Self {
            rules: RuleEngine::new(&config.rules),
            classifier,
            status,
            decision: DecisionEngine::new(config.fusion.clone()),
            include_sender: config.classifier.include_sender,
        }
    }

    /// Rules only, no model.
    pub fn rules_only(config: &Config) -> Self {
        Self::with_classifier(config, Box::new(NullClassifier), ClassifierStatus::Disabled)
    }

    pub fn detect(&self, message: &EmailMessage) -> DetectionReport {
        let text = compose_text(message, self.include_sender);
        let probability = self.classifier.score(&text);
        self.detect_with_probability(message, probability)
    }

    /// Run the rules and fuse them with a probability computed elsewhere.
    pub fn detect_with_probability(
        &self,
        message: &EmailMessage,
        probability: f64,
    ) -> DetectionReport {
        let rule_verdict = self
            .rules
            .check(&message.subject, &message.body, &message.from_address);
        let result = self.decision.decide(&rule_verdict, probability);

        log::debug!(
            "Verdict: {} ({} reason(s), classifier {})",
            if result.verdict { "PHISHING" } else { "SAFE" },
            result.reasons.len(),
            self.classifier.name()
        );

        DetectionReport {
            result,
            classifier: self.status.clone(),
        }
    }

    pub fn classifier_status(&self) -> &ClassifierStatus {
        &self.status
    }
}
