use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Words and phrases whose presence in subject or body counts as a heuristic hit.
pub const DEFAULT_SUSPICIOUS_WORDS: &[&str] = &[
    // urgency & fear
    "action required", "immediately", "now", "urgent", "warning", "emergency",
    "last chance", "suspended", "locked", "terminated", "problem", "issue",
    "frozen", "breach", "compromised", "failed", "overdue", "penalty", "violation",
    // account & login
    "account", "login", "password", "verify", "confirm", "update", "reset",
    "security", "credentials", "profile", "access", "authentication",
    "invoice", "payment", "bill", "transfer", "refund", "deposit", "wire",
    "credit", "debit",
    // money, prizes, rewards
    "gift card", "prize", "winnings", "bonus", "reward", "free", "offer",
    "coupon", "exclusive", "claim", "winner", "lottery",
    // personal information
    "social security", "ssn", "confidential", "sensitive", "private",
    "personal information", "date of birth", "address", "username", "pin",
    "passcode", "secret question",
    // jobs
    "job", "employment", "interview", "application",
    // greetings
    "dear customer", "dear user", "dear valued member", "sir/madam",
    "kindly do the needful", "important notification",
    // calls to action
    "click here", "click on the link",
    // IT alerts
    "system", "server", "database", "maintenance", "notification", "alert",
    "support", "technical", "message", "document", "file",
];

pub const DEFAULT_SHORTENERS: &[&str] = &[
    "bit.ly", "goo.gl", "t.co", "tinyurl.com", "ow.ly", "is.gd", "buff.ly",
];

pub const DEFAULT_PATH_TOKENS: &[&str] = &["login", "verify", "update", "secure", "confirm"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rules: RuleConfig,
    #[serde(default)]
    pub fusion: FusionConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub suspicious_words: Vec<String>,
    pub shorteners: Vec<String>,
    pub suspicious_path_tokens: Vec<String>,
    /// Subdomain labels (before the registrable domain) at which a host is flagged.
    pub max_subdomains: usize,
    /// Suffixes recognised in addition to the ICANN Public Suffix List.
    pub public_suffixes: Vec<String>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        let owned = |items: &[&str]| -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        };
        Self {
            suspicious_words: owned(DEFAULT_SUSPICIOUS_WORDS),
            shorteners: owned(DEFAULT_SHORTENERS),
            suspicious_path_tokens: owned(DEFAULT_PATH_TOKENS),
            max_subdomains: 3,
            public_suffixes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Probability needed when the rules found nothing.
    pub base_threshold: f64,
    /// Probability needed once the rules already flagged the message.
    pub adaptive_threshold: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            base_threshold: 0.5,
            adaptive_threshold: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierMode {
    /// Load the model if present, otherwise run rules-only with a warning.
    Auto,
    /// Refuse to start without the model.
    Required,
    /// Never load the model.
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub mode: ClassifierMode,
    pub vectorizer_path: String,
    pub model_path: String,
    /// Prepend a `From:` line to the text handed to the model.
    pub include_sender: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            mode: ClassifierMode::Auto,
            vectorizer_path: "models/tfidf.json".to_string(),
            model_path: "models/phish_model.json".to_string(),
            include_sender: false,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?;
        Ok(config)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;
        Ok(())
    }

    /// Load `path` if it exists, otherwise fall back to the built-in defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let config = Self::from_file(path)?;
            log::info!("Loaded configuration from: {}", path.display());
            Ok(config)
        } else {
            log::warn!(
                "Configuration file '{}' not found, using default configuration",
                path.display()
            );
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let fusion = &self.fusion;
        for (name, value) in [
            ("base_threshold", fusion.base_threshold),
            ("adaptive_threshold", fusion.adaptive_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("fusion.{name} must be within [0, 1], got {value}");
            }
        }
        if fusion.adaptive_threshold > fusion.base_threshold {
            bail!(
                "fusion.adaptive_threshold ({}) must not exceed fusion.base_threshold ({})",
                fusion.adaptive_threshold,
                fusion.base_threshold
            );
        }
        if self.rules.max_subdomains == 0 {
            bail!("rules.max_subdomains must be at least 1");
        }
        if self.rules.suspicious_words.iter().any(|w| w.trim().is_empty()) {
            bail!("rules.suspicious_words contains an empty entry");
        }
        if self.rules.suspicious_words.is_empty() {
            log::warn!("rules.suspicious_words is empty; keyword checks are disabled");
        }
        Ok(())
    }
}
