pub mod classifier;
pub mod config;
pub mod detector;
pub mod domain_utils;
pub mod fusion;
pub mod message;
pub mod rule_engine;
pub mod url_features;

pub use classifier::{ClassifierStatus, FixedScore, NullClassifier, PhishingClassifier};
pub use config::Config;
pub use detector::{DetectionReport, PhishingDetector};
pub use fusion::{DecisionEngine, DetectionResult};
pub use message::EmailMessage;
pub use rule_engine::{RuleEngine, RuleVerdict};
pub use url_features::{UrlFeatureExtractor, UrlFeatures};
