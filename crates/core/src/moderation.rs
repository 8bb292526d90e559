//! Moderation outcomes: what the policy resolvers decide.

use serde::{Deserialize, Serialize};

/// What happens to a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAction {
    /// Pass the text through unchanged.
    Keep,
    /// Irreversibly mask the text.
    Remove,
    /// Replace with a placeholder; the original is recoverable.
    Encrypt,
}

impl TextAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keep => "keep",
            Self::Remove => "remove",
            Self::Encrypt => "encrypt",
        }
    }
}

impl std::fmt::Display for TextAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens to an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageAction {
    Allow,
    Warn,
    Blur,
    Block,
}

impl ImageAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Warn => "warn",
            Self::Blur => "blur",
            Self::Block => "block",
        }
    }
}

impl std::fmt::Display for ImageAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered image risk classification: `Safe < PotentiallyConcerning <
/// Questionable < Unsafe`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SeverityTier {
    #[default]
    Safe,
    PotentiallyConcerning,
    Questionable,
    Unsafe,
}

impl SeverityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::PotentiallyConcerning => "potentially_concerning",
            Self::Questionable => "questionable",
            Self::Unsafe => "unsafe",
        }
    }
}

impl std::fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_ordered_by_severity() {
        assert!(SeverityTier::Safe < SeverityTier::PotentiallyConcerning);
        assert!(SeverityTier::PotentiallyConcerning < SeverityTier::Questionable);
        assert!(SeverityTier::Questionable < SeverityTier::Unsafe);
    }

    #[test]
    fn wire_names_are_snake_case() {
        assert_eq!(
            serde_json::to_string(&SeverityTier::PotentiallyConcerning).unwrap(),
            "\"potentially_concerning\""
        );
        assert_eq!(serde_json::to_string(&TextAction::Encrypt).unwrap(), "\"encrypt\"");
        let action: ImageAction = serde_json::from_str("\"warn\"").unwrap();
        assert_eq!(action, ImageAction::Warn);
    }

    #[test]
    fn display_matches_wire_name() {
        assert_eq!(TextAction::Remove.to_string(), "remove");
        assert_eq!(ImageAction::Block.to_string(), "block");
        assert_eq!(SeverityTier::Unsafe.to_string(), "unsafe");
    }
}
