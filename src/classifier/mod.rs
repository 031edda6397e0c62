pub mod linear;

use crate::config::{ClassifierConfig, ClassifierMode};
use crate::message::EmailMessage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub use linear::{LinearTextClassifier, LogisticRegression, TfidfVectorizer};

/// Anything that can turn message text into a phishing probability.
pub trait PhishingClassifier: Send + Sync {
    /// Probability of the phishing class, in `[0, 1]`.
    fn score(&self, text: &str) -> f64;
    fn name(&self) -> &str;
}

/// Stand-in used when no model is available: always scores 0.0, which
/// leaves the verdict to the rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullClassifier;

impl PhishingClassifier for NullClassifier {
    fn score(&self, _text: &str) -> f64 {
        0.0
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Returns the same probability for every text. Used for externally
/// supplied scores and in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedScore(pub f64);

impl PhishingClassifier for FixedScore {
    fn score(&self, _text: &str) -> f64 {
        self.0
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("model artifact not found: {}", path.display())]
    ArtifactMissing { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("model shape mismatch: {0}")]
    Shape(String),
}

/// Whether a model backs the detector, for reporting alongside verdicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ClassifierStatus {
    Loaded { name: String },
    Disabled,
    Unavailable { reason: String },
}

impl ClassifierStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, ClassifierStatus::Loaded { .. })
    }

    /// Warning text when detection runs with reduced sensitivity.
    pub fn warning(&self) -> Option<String> {
        match self {
            ClassifierStatus::Unavailable { reason } => Some(format!(
                "Classifier unavailable ({}); running in rules-only mode",
                reason
            )),
            _ => None,
        }
    }
}

/// Text handed to the classifier for a message.
pub fn compose_text(message: &EmailMessage, include_sender: bool) -> String {
    if include_sender {
        format!(
            "Subject: {}\nFrom: {}\nBody: {}",
            message.subject, message.from_address, message.body
        )
    } else {
        format!("Subject: {}\nBody: {}", message.subject, message.body)
    }
}

/// Build the classifier described by `config`.
///
/// In `Auto` mode a missing or broken model degrades to [`NullClassifier`]
/// with an `Unavailable` status; in `Required` mode the error is returned.
pub fn load_classifier(
    config: &ClassifierConfig,
) -> Result<(Box<dyn PhishingClassifier>, ClassifierStatus), ClassifierError> {
    if config.mode == ClassifierMode::Disabled {
        log::info!("Classifier disabled, using rules only");
        return Ok((Box::new(NullClassifier), ClassifierStatus::Disabled));
    }

    match LinearTextClassifier::load(&config.vectorizer_path, &config.model_path) {
        Ok(model) => {
            log::info!(
                "Loaded classifier from {} ({} features)",
                config.model_path,
                model.feature_count()
            );
            let status = ClassifierStatus::Loaded {
                name: model.name().to_string(),
            };
            Ok((Box::new(model), status))
        }
        Err(e) if config.mode == ClassifierMode::Auto => {
            log::warn!("{}; falling back to rules-only detection", e);
            Ok((
                Box::new(NullClassifier),
                ClassifierStatus::Unavailable {
                    reason: e.to_string(),
                },
            ))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> EmailMessage {
        EmailMessage::new("Hello", "Body text", "a@b.com")
    }

    #[test]
    fn test_compose_text() {
        assert_eq!(
            compose_text(&message(), false),
            "Subject: Hello\nBody: Body text"
        );
        assert_eq!(
            compose_text(&message(), true),
            "Subject: Hello\nFrom: a@b.com\nBody: Body text"
        );
    }

    #[test]
    fn test_disabled_mode() {
        let config = ClassifierConfig {
            mode: ClassifierMode::Disabled,
            ..ClassifierConfig::default()
        };
        let (classifier, status) = load_classifier(&config).unwrap();
        assert_eq!(status, ClassifierStatus::Disabled);
        assert_eq!(classifier.score("anything"), 0.0);
        assert!(status.warning().is_none());
    }

    #[test]
    fn test_auto_mode_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClassifierConfig {
            mode: ClassifierMode::Auto,
            vectorizer_path: dir.path().join("tfidf.json").display().to_string(),
            model_path: dir.path().join("model.json").display().to_string(),
            include_sender: false,
        };
        let (classifier, status) = load_classifier(&config).unwrap();
        assert!(matches!(status, ClassifierStatus::Unavailable { .. }));
        assert!(status.warning().unwrap().contains("rules-only"));
        assert_eq!(classifier.score("urgent"), 0.0);
        assert_eq!(classifier.name(), "none");
    }

    #[test]
    fn test_required_mode_errors() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClassifierConfig {
            mode: ClassifierMode::Required,
            vectorizer_path: dir.path().join("tfidf.json").display().to_string(),
            model_path: dir.path().join("model.json").display().to_string(),
            include_sender: false,
        };
        match load_classifier(&config) {
            Err(ClassifierError::ArtifactMissing { path }) => {
                assert!(path.ends_with("tfidf.json"));
            }
            other => panic!("expected ArtifactMissing, got {:?}", other.map(|(_, s)| s)),
        }
    }
}
