//! TF-IDF vectorizer + logistic regression, loaded from JSON artifacts
//! written by the training pipeline.

use super::{ClassifierError, PhishingClassifier};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

static TOKEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern compiles"));

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    /// Term -> column index.
    pub vocabulary: HashMap<String, usize>,
    /// Inverse document frequency per column.
    pub idf: Vec<f64>,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub stop_words: HashSet<String>,
    #[serde(default = "default_true")]
    pub lowercase: bool,
    #[serde(default)]
    pub sublinear_tf: bool,
}

impl TfidfVectorizer {
    pub fn feature_count(&self) -> usize {
        self.idf.len()
    }

    fn terms(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        let tokens: Vec<&str> = TOKEN_REGEX
            .find_iter(&text)
            .map(|m| m.as_str())
            .filter(|t| !self.stop_words.contains(*t))
            .collect();

        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n.max(1)..=max_n {
            if n > tokens.len() {
                break;
            }
            terms.extend(tokens.windows(n).map(|w| w.join(" ")));
        }
        terms
    }

    /// Sparse, L2-normalised TF-IDF row for `text` (column -> weight).
    pub fn transform(&self, text: &str) -> BTreeMap<usize, f64> {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in self.terms(text) {
            if let Some(&column) = self.vocabulary.get(&term) {
                *counts.entry(column).or_insert(0.0) += 1.0;
            }
        }

        for (column, value) in counts.iter_mut() {
            let tf = if self.sublinear_tf {
                1.0 + value.ln()
            } else {
                *value
            };
            *value = tf * self.idf.get(*column).copied().unwrap_or(0.0);
        }

        let norm = counts.values().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in counts.values_mut() {
                *value /= norm;
            }
        }
        counts
    }

    fn check_shape(&self) -> Result<(), ClassifierError> {
        if let Some((term, &column)) = self
            .vocabulary
            .iter()
            .find(|&(_, &column)| column >= self.idf.len())
        {
            return Err(ClassifierError::Shape(format!(
                "term '{}' maps to column {} but idf has {} entries",
                term,
                column,
                self.idf.len()
            )));
        }
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ClassifierError::Shape(format!(
                "invalid ngram_range ({}, {})",
                min_n, max_n
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticRegression {
    pub fn predict_proba(&self, features: &BTreeMap<usize, f64>) -> f64 {
        let z = self.intercept
            + features
                .iter()
                .map(|(&column, &value)| {
                    self.coefficients.get(column).copied().unwrap_or(0.0) * value
                })
                .sum::<f64>();
        1.0 / (1.0 + (-z).exp())
    }
}

pub struct LinearTextClassifier {
    vectorizer: TfidfVectorizer,
    model: LogisticRegression,
}

impl LinearTextClassifier {
    pub fn new(
        vectorizer: TfidfVectorizer,
        model: LogisticRegression,
    ) -> Result<Self, ClassifierError> {
        vectorizer.check_shape()?;
        if model.coefficients.len() != vectorizer.feature_count() {
            return Err(ClassifierError::Shape(format!(
                "model has {} coefficients but vectorizer produces {} features",
                model.coefficients.len(),
                vectorizer.feature_count()
            )));
        }
        Ok(Self { vectorizer, model })
    }

    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(
        vectorizer_path: P,
        model_path: Q,
    ) -> Result<Self, ClassifierError> {
        let vectorizer: TfidfVectorizer = read_artifact(vectorizer_path.as_ref())?;
        let model: LogisticRegression = read_artifact(model_path.as_ref())?;
        Self::new(vectorizer, model)
    }

    pub fn feature_count(&self) -> usize {
        self.vectorizer.feature_count()
    }
}

impl PhishingClassifier for LinearTextClassifier {
    fn score(&self, text: &str) -> f64 {
        let features = self.vectorizer.transform(text);
        let probability = self.model.predict_proba(&features);
        log::debug!(
            "Classifier: {} active feature(s), p(phishing)={:.4}",
            features.len(),
            probability
        );
        probability
    }

    fn name(&self) -> &str {
        "tfidf-logistic"
    }
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> Result<T, ClassifierError> {
    if !path.exists() {
        return Err(ClassifierError::ArtifactMissing {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path).map_err(|source| ClassifierError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ClassifierError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
