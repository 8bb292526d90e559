//! Text policy: detection signals → keep, remove, or encrypt.
//!
//! Rules, first match wins:
//! 1. hate speech → remove
//! 2. profanity → remove
//! 3. any sensitive-information match → encrypt, one reason per category
//! 4. otherwise keep

use serde::Serialize;
use socio_config::TextConfig;
use socio_core::{DetectionSignals, TextAction};
use tracing::debug;

use crate::format::category_reason;

/// The resolved action and the reasons behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextDecision {
    pub action: TextAction,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TextPolicy {
    placeholder: String,
    mask_char: char,
}

impl Default for TextPolicy {
    fn default() -> Self {
        Self::new(&TextConfig::default())
    }
}

impl TextPolicy {
    pub fn new(config: &TextConfig) -> Self {
        Self {
            placeholder: config.placeholder.clone(),
            mask_char: config.mask_char,
        }
    }

    pub fn resolve(&self, signals: &DetectionSignals) -> TextDecision {
        let decision = if signals.hate_speech {
            TextDecision {
                action: TextAction::Remove,
                reasons: vec!["Hate speech detected".into()],
            }
        } else if signals.profanity {
            TextDecision {
                action: TextAction::Remove,
                reasons: vec!["Profanity detected".into()],
            }
        } else if signals.has_sensitive_info() {
            TextDecision {
                action: TextAction::Encrypt,
                reasons: signals.flagged_categories().map(category_reason).collect(),
            }
        } else {
            TextDecision {
                action: TextAction::Keep,
                reasons: Vec::new(),
            }
        };

        debug!(
            action = %decision.action,
            reasons = decision.reasons.len(),
            "Text policy resolved"
        );
        decision
    }

    /// The text shown in place of `text` for `action`.
    ///
    /// For `encrypt` this is only the placeholder; sealing the original is
    /// the caller's job.
    pub fn render(&self, text: &str, action: TextAction) -> String {
        match action {
            TextAction::Keep => text.to_string(),
            TextAction::Remove => self.mask(text),
            TextAction::Encrypt => self.placeholder.clone(),
        }
    }

    /// One mask character per character of `text`.
    pub fn mask(&self, text: &str) -> String {
        std::iter::repeat_n(self.mask_char, text.chars().count()).collect()
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> TextPolicy {
        TextPolicy::default()
    }

    #[test]
    fn hate_speech_wins_over_everything() {
        let signals = DetectionSignals {
            hate_speech: true,
            profanity: true,
            ..Default::default()
        }
        .with_sensitive("email", &["a@b.com"]);

        let decision = policy().resolve(&signals);
        assert_eq!(decision.action, TextAction::Remove);
        assert_eq!(decision.reasons, vec!["Hate speech detected"]);
    }

    #[test]
    fn profanity_removes() {
        let signals = DetectionSignals {
            profanity: true,
            ..Default::default()
        }
        .with_sensitive("ssn", &["123-45-6789"]);

        let decision = policy().resolve(&signals);
        assert_eq!(decision.action, TextAction::Remove);
        assert_eq!(decision.reasons, vec!["Profanity detected"]);
    }

    #[test]
    fn sensitive_info_encrypts_with_one_reason_per_category() {
        let signals = DetectionSignals::default()
            .with_sensitive("phone_number", &["555-123-4567"])
            .with_sensitive("email", &["a@b.com", "c@d.org"])
            .with_sensitive("credit_card", &[]);

        let decision = policy().resolve(&signals);
        assert_eq!(decision.action, TextAction::Encrypt);
        assert_eq!(
            decision.reasons,
            vec!["Email detected", "Phone Number detected"]
        );
    }

    #[test]
    fn empty_categories_keep() {
        let signals = DetectionSignals::default().with_sensitive("email", &[]);
        let decision = policy().resolve(&signals);
        assert_eq!(decision.action, TextAction::Keep);
        assert!(decision.reasons.is_empty());
    }

    #[test]
    fn remove_masks_every_character() {
        let p = policy();
        assert_eq!(p.render("I will kill you", TextAction::Remove), "*".repeat(15));
        assert_eq!(p.render("héllo 🌍", TextAction::Remove), "*******");
        assert_eq!(p.render("", TextAction::Remove), "");
    }

    #[test]
    fn keep_and_encrypt_rendering() {
        let p = policy();
        assert_eq!(p.render("fine text", TextAction::Keep), "fine text");
        assert_eq!(
            p.render("mail me at a@b.com", TextAction::Encrypt),
            "[Encrypted content]"
        );
    }

    #[test]
    fn custom_mask_and_placeholder() {
        let p = TextPolicy::new(&TextConfig {
            placeholder: "[hidden]".into(),
            mask_char: '#',
        });
        assert_eq!(p.render("abc", TextAction::Remove), "###");
        assert_eq!(p.render("abc", TextAction::Encrypt), "[hidden]");
    }
}
