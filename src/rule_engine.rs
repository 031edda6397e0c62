//! Keyword and URL heuristics.
//!
//! The rule engine scans the lowercased subject and body for suspicious
//! phrases, inspects every URL it finds, and checks whether the sender's
//! domain shows up in the text when links are present. Each hit becomes one
//! human-readable reason; a message is suspicious iff at least one reason
//! was recorded.

use crate::config::RuleConfig;
use crate::domain_utils::DomainUtils;
use crate::url_features::{UrlFeatureExtractor, UrlFeatures};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const SENDER_MISMATCH_REASON: &str = "Sender domain not mentioned in body but links present";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleVerdict {
    pub is_suspicious: bool,
    pub reasons: Vec<String>,
}

impl RuleVerdict {
    pub fn from_reasons(reasons: Vec<String>) -> Self {
        Self {
            is_suspicious: !reasons.is_empty(),
            reasons,
        }
    }
}

pub struct RuleEngine {
    /// Sorted so keyword reasons come out in a stable order.
    suspicious_words: BTreeSet<String>,
    url_extractor: UrlFeatureExtractor,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(&RuleConfig::default())
    }
}

impl RuleEngine {
    pub fn new(config: &RuleConfig) -> Self {
        let suspicious_words: BTreeSet<String> = config
            .suspicious_words
            .iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        log::debug!(
            "Rule engine ready: {} suspicious words, {} shorteners",
            suspicious_words.len(),
            config.shorteners.len()
        );

        Self {
            suspicious_words,
            url_extractor: UrlFeatureExtractor::from_config(config),
        }
    }

    pub fn check(&self, subject: &str, body: &str, from_address: &str) -> RuleVerdict {
        let text = format!("{} {}", subject, body).to_lowercase();
        let mut reasons = Vec::new();

        for word in &self.suspicious_words {
            if text.contains(word.as_str()) {
                reasons.push(format!("Suspicious word found: '{}'", word));
            }
        }

        let urls = self.url_extractor.analyze_text(&text);
        for features in &urls {
            reasons.extend(Self::url_reasons(features));
        }

        let sender_domain = DomainUtils::sender_domain(from_address);
        if !urls.is_empty() && !text.contains(sender_domain.as_str()) {
            reasons.push(SENDER_MISMATCH_REASON.to_string());
        }

        let verdict = RuleVerdict::from_reasons(reasons);
        log::debug!(
            "Rules: suspicious={} ({} reason(s), {} URL(s))",
            verdict.is_suspicious,
            verdict.reasons.len(),
            urls.len()
        );
        verdict
    }

    fn url_reasons(features: &UrlFeatures) -> Vec<String> {
        let url = &features.url;
        let mut reasons = Vec::new();
        if features.has_ip_host {
            reasons.push(format!("URL uses raw IP: {}", url));
        }
        if features.subdomain_count_excessive {
            reasons.push(format!("URL has many subdomains: {}", url));
        }
        if features.contains_at_symbol {
            reasons.push(format!("URL contains @ symbol: {}", url));
        }
        if features.suspicious_path_token {
            reasons.push(format!("Suspicious path in URL: {}", url));
        }
        if features.is_known_shortener {
            reasons.push(format!(
                "URL uses shortener ({}): {}",
                features.registrable_domain, url
            ));
        }
        reasons
    }
}
