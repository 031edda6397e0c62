use crate::config::RuleConfig;
use crate::domain_utils::DomainUtils;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

static URL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)https?://[^\s)>\]"']+"#).expect("URL pattern compiles"));

static IP_HOST_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^https?://(\d{1,3}\.){3}\d{1,3}").expect("IP host pattern compiles")
});

/// Structural risk features of a single URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlFeatures {
    pub url: String,
    pub has_ip_host: bool,
    pub subdomain_count_excessive: bool,
    pub contains_at_symbol: bool,
    pub suspicious_path_token: bool,
    pub is_known_shortener: bool,
    pub registrable_domain: String,
}

impl UrlFeatures {
    /// True when any risk flag is set.
    pub fn is_risky(&self) -> bool {
        self.has_ip_host
            || self.subdomain_count_excessive
            || self.contains_at_symbol
            || self.suspicious_path_token
            || self.is_known_shortener
    }
}

/// Finds URLs in free text and scores their structure.
#[derive(Debug, Clone)]
pub struct UrlFeatureExtractor {
    suspicious_path_tokens: Vec<String>,
    shorteners: BTreeSet<String>,
    public_suffixes: BTreeSet<String>,
    max_subdomains: usize,
}

impl Default for UrlFeatureExtractor {
    fn default() -> Self {
        Self::from_config(&RuleConfig::default())
    }
}

impl UrlFeatureExtractor {
    pub fn from_config(config: &RuleConfig) -> Self {
        let lower = |items: &[String]| -> BTreeSet<String> {
            items.iter().map(|s| s.trim().to_lowercase()).collect()
        };

        Self {
            suspicious_path_tokens: lower(&config.suspicious_path_tokens).into_iter().collect(),
            shorteners: lower(&config.shorteners),
            public_suffixes: lower(&config.public_suffixes),
            max_subdomains: config.max_subdomains,
        }
    }

    /// All URL substrings of `text`, in order of appearance.
    pub fn extract_urls<'a>(&self, text: &'a str) -> Vec<&'a str> {
        URL_REGEX.find_iter(text).map(|m| m.as_str()).collect()
    }

    pub fn features(&self, url: &str) -> UrlFeatures {
        let host = DomainUtils::url_host(url);
        let parts = DomainUtils::split_host(&host, &self.public_suffixes);
        let registrable_domain = parts.registrable_domain();
        let url_lower = url.to_lowercase();

        log::trace!(
            "URL {} -> host '{}', registrable '{}', {} subdomain label(s)",
            url,
            host,
            registrable_domain,
            parts.subdomains.len()
        );

        UrlFeatures {
            url: url.to_string(),
            has_ip_host: IP_HOST_REGEX.is_match(url),
            subdomain_count_excessive: !parts.subdomains.is_empty()
                && parts.subdomains.len() >= self.max_subdomains,
            contains_at_symbol: url.contains('@'),
            suspicious_path_token: self
                .suspicious_path_tokens
                .iter()
                .any(|token| url_lower.contains(token.as_str())),
            is_known_shortener: self.shorteners.contains(&registrable_domain),
            registrable_domain,
        }
    }

    /// Extract every URL in `text` and compute its features.
    pub fn analyze_text(&self, text: &str) -> Vec<UrlFeatures> {
        self.extract_urls(text)
            .into_iter()
            .map(|url| self.features(url))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_urls_stops_at_delimiters() {
        let extractor = UrlFeatureExtractor::default();
        let text = r#"see (http://a.com/x) and <https://b.org/y> or "http://c.net/z" [http://d.io]"#;
        assert_eq!(
            extractor.extract_urls(text),
            vec!["http://a.com/x", "https://b.org/y", "http://c.net/z", "http://d.io"]
        );
    }

    #[test]
    fn test_extract_urls_case_insensitive_scheme() {
        let extractor = UrlFeatureExtractor::default();
        assert_eq!(
            extractor.extract_urls("Go to HTTPS://Example.com now"),
            vec!["HTTPS://Example.com"]
        );
        assert!(extractor.extract_urls("ftp://example.com http://").is_empty());
    }

    #[test]
    fn test_shortener_detection() {
        let extractor = UrlFeatureExtractor::default();
        let features = extractor.features("http://bit.ly/fake-login");
        assert!(features.is_known_shortener);
        assert!(features.suspicious_path_token);
        assert_eq!(features.registrable_domain, "bit.ly");
        assert!(!features.has_ip_host);
    }

    #[test]
    fn test_at_symbol_url() {
        let extractor = UrlFeatureExtractor::default();
        let features = extractor.features("http://safe.com@evil.com/login");
        assert!(features.contains_at_symbol);
        assert!(features.suspicious_path_token);
        assert_eq!(features.registrable_domain, "evil.com");
    }

    #[test]
    fn test_raw_ip_host() {
        let extractor = UrlFeatureExtractor::default();
        let features = extractor.features("http://192.168.10.5/account");
        assert!(features.has_ip_host);
        assert!(!features.subdomain_count_excessive);

        // IP after user-info is not "immediately following the scheme".
        let features = extractor.features("http://me@192.168.10.5/account");
        assert!(!features.has_ip_host);
    }

    #[test]
    fn test_subdomain_limit() {
        let extractor = UrlFeatureExtractor::default();
        assert!(
            extractor
                .features("https://a.b.c.paypal.com.example.com/")
                .subdomain_count_excessive
        );
        assert!(
            !extractor
                .features("https://mail.google.com/")
                .subdomain_count_excessive
        );
        assert!(
            !extractor
                .features("https://x.y.example.co.uk/")
                .subdomain_count_excessive
        );
    }

    #[test]
    fn test_missing_suffix_degrades() {
        let extractor = UrlFeatureExtractor::default();
        let features = extractor.features("http://localhost/verify");
        assert_eq!(features.registrable_domain, "localhost");
        assert!(features.suspicious_path_token);
        assert!(!features.is_known_shortener);

        let features = extractor.features("http://");
        assert_eq!(features.registrable_domain, "");
        assert!(!features.is_risky());
    }

    #[test]
    fn test_country_suffix_hosts_are_not_deep() {
        let extractor = UrlFeatureExtractor::default();
        for url in [
            "https://portal.bank.com.ng/",
            "https://www.bank.co.id/",
            "https://online.shop.com.pk/",
            "https://www.paypal.evil.ml/",
        ] {
            let features = extractor.features(url);
            assert!(!features.subdomain_count_excessive, "{}", url);
            assert!(!features.is_risky(), "{}", url);
        }
        assert_eq!(
            extractor.features("https://portal.bank.com.ng/").registrable_domain,
            "bank.com.ng"
        );
    }

    #[test]
    fn test_custom_shorteners() {
        let config = RuleConfig {
            shorteners: vec!["rb.gy".to_string(), "S.ID".to_string(), "bl.ink".to_string()],
            ..RuleConfig::default()
        };
        let extractor = UrlFeatureExtractor::from_config(&config);
        for (url, domain) in [
            ("https://rb.gy/abc", "rb.gy"),
            ("https://s.id/abc", "s.id"),
            ("https://bl.ink/abc", "bl.ink"),
        ] {
            let features = extractor.features(url);
            assert_eq!(features.registrable_domain, domain);
            assert!(features.is_known_shortener, "{}", url);
        }
        assert!(!extractor.features("http://bit.ly/x").is_known_shortener);
    }

    #[test]
    fn test_features_idempotent() {
        let extractor = UrlFeatureExtractor::default();
        let text = "login at http://1.2.3.4/secure and http://t.co/x@y";
        assert_eq!(extractor.analyze_text(text), extractor.analyze_text(text));
    }
}
