//! Lexicon text detector.
//!
//! Hate speech and profanity are whole-word (or whole-phrase) matches against
//! configurable word lists, case-insensitive. Sensitive information is found
//! with one regular expression per category.

use async_trait::async_trait;
use regex_lite::Regex;
use socio_config::DetectorConfig;
use socio_core::{DetectionSignals, Error, TextDetector, UpstreamError};
use std::collections::BTreeMap;
use tracing::debug;

/// Built-in sensitive-information patterns, keyed by category name.
const SENSITIVE_PATTERNS: &[(&str, &str)] = &[
    ("email", r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}"),
    (
        "phone_number",
        r"(?:\+\d{1,2}[\s.-]?)?\(?\b\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}\b",
    ),
    ("credit_card", r"\b(?:\d[ -]?){12,15}\d\b"),
    ("ssn", r"\b\d{3}-\d{2}-\d{4}\b"),
    (
        "ip_address",
        r"\b(?:(?:25[0-5]|2[0-4]\d|1?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|1?\d?\d)\b",
    ),
];

/// A [`TextDetector`] backed by word lists and regular expressions.
#[derive(Debug, Default)]
pub struct LexiconDetector {
    hate: Option<Regex>,
    profanity: Option<Regex>,
    sensitive: Vec<(String, Regex)>,
}

impl LexiconDetector {
    /// Build a detector from configuration.
    ///
    /// Fails on an unknown sensitive-information category.
    pub fn new(config: &DetectorConfig) -> Result<Self, Error> {
        let mut sensitive = Vec::with_capacity(config.sensitive_categories.len());
        for category in &config.sensitive_categories {
            let pattern = SENSITIVE_PATTERNS
                .iter()
                .find(|(name, _)| *name == category.as_str())
                .map(|(_, pattern)| *pattern)
                .ok_or_else(|| Error::Config {
                    message: format!("unknown sensitive-information category '{category}'"),
                })?;
            sensitive.push((category.clone(), compile(pattern)?));
        }

        Ok(Self {
            hate: word_list(&config.hate_terms)?,
            profanity: word_list(&config.profanity_terms)?,
            sensitive,
        })
    }

    /// Names of the sensitive-information categories this detector knows.
    pub fn known_categories() -> impl Iterator<Item = &'static str> {
        SENSITIVE_PATTERNS.iter().map(|(name, _)| *name)
    }

    fn scan(&self, text: &str) -> DetectionSignals {
        let hits = |re: &Option<Regex>| re.as_ref().is_some_and(|re| re.is_match(text));

        let mut sensitive_info = BTreeMap::new();
        for (category, re) in &self.sensitive {
            let spans: Vec<String> = re.find_iter(text).map(|m| m.as_str().to_string()).collect();
            if !spans.is_empty() {
                sensitive_info.insert(category.clone(), spans);
            }
        }

        DetectionSignals {
            hate_speech: hits(&self.hate),
            profanity: hits(&self.profanity),
            sensitive_info,
        }
    }
}

#[async_trait]
impl TextDetector for LexiconDetector {
    fn name(&self) -> &str {
        "lexicon"
    }

    async fn detect(&self, text: &str) -> Result<DetectionSignals, UpstreamError> {
        let signals = self.scan(text);
        debug!(
            chars = text.chars().count(),
            hate_speech = signals.hate_speech,
            profanity = signals.profanity,
            sensitive = signals.sensitive_info.len(),
            "Lexicon scan complete"
        );
        Ok(signals)
    }
}

/// One case-insensitive alternation of whole words/phrases, or `None` for an
/// empty list. Whitespace inside a phrase matches any run of whitespace.
fn word_list(terms: &[String]) -> Result<Option<Regex>, Error> {
    let alternatives: Vec<String> = terms
        .iter()
        .map(|term| {
            term.split_whitespace()
                .map(regex_lite::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .filter(|alt| !alt.is_empty())
        .collect();

    if alternatives.is_empty() {
        return Ok(None);
    }
    compile(&format!(r"(?i)\b(?:{})\b", alternatives.join("|"))).map(Some)
}

fn compile(pattern: &str) -> Result<Regex, Error> {
    Regex::new(pattern).map_err(|e| Error::Config {
        message: format!("invalid detector pattern: {e}"),
    })
}
