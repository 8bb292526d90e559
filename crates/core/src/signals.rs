//! Raw detection signals produced by the external collaborators.
//!
//! These records are immutable once received: the policy resolvers read
//! them, the log store persists them, nothing rewrites them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output of the text classifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionSignals {
    #[serde(default)]
    pub hate_speech: bool,

    #[serde(default)]
    pub profanity: bool,

    /// Sensitive-information category (e.g. `email`) → matched spans.
    ///
    /// Sorted by category so reason lists come out in a stable order.
    #[serde(default)]
    pub sensitive_info: BTreeMap<String, Vec<String>>,
}

impl DetectionSignals {
    /// Categories with at least one match, in sorted order.
    pub fn flagged_categories(&self) -> impl Iterator<Item = &str> {
        self.sensitive_info
            .iter()
            .filter(|(_, spans)| !spans.is_empty())
            .map(|(category, _)| category.as_str())
    }

    pub fn has_sensitive_info(&self) -> bool {
        self.flagged_categories().next().is_some()
    }

    /// Record matches for a category (builder style).
    pub fn with_sensitive(mut self, category: &str, spans: &[&str]) -> Self {
        self.sensitive_info.insert(
            category.to_string(),
            spans.iter().map(|s| s.to_string()).collect(),
        );
        self
    }
}

/// A safe-search category reported by the vision collaborator.
///
/// Declaration order is the evaluation order of the image policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafeSearchCategory {
    Adult,
    Violence,
    Racy,
    Medical,
    Spoof,
}

impl SafeSearchCategory {
    pub const ALL: [SafeSearchCategory; 5] = [
        Self::Adult,
        Self::Violence,
        Self::Racy,
        Self::Medical,
        Self::Spoof,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adult => "adult",
            Self::Violence => "violence",
            Self::Racy => "racy",
            Self::Medical => "medical",
            Self::Spoof => "spoof",
        }
    }
}

impl std::fmt::Display for SafeSearchCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vision API likelihood bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Likelihood {
    #[default]
    Unknown,
    VeryUnlikely,
    Unlikely,
    Possible,
    Likely,
    VeryLikely,
}

impl Likelihood {
    /// Numeric score for the bucket.
    pub fn score(&self) -> f32 {
        match self {
            Self::Unknown => 0.0,
            Self::VeryUnlikely => 0.1,
            Self::Unlikely => 0.3,
            Self::Possible => 0.5,
            Self::Likely => 0.7,
            Self::VeryLikely => 0.9,
        }
    }

    /// Nearest bucket for a raw score, used when a collaborator reports
    /// scores without labels.
    pub fn from_score(score: f32) -> Self {
        match score {
            s if s >= 0.9 => Self::VeryLikely,
            s if s >= 0.7 => Self::Likely,
            s if s >= 0.5 => Self::Possible,
            s if s >= 0.3 => Self::Unlikely,
            s if s > 0.0 => Self::VeryUnlikely,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafeSearchScore {
    pub score: f32,
    #[serde(default)]
    pub likelihood: Likelihood,
}

impl SafeSearchScore {
    pub fn from_likelihood(likelihood: Likelihood) -> Self {
        Self {
            score: likelihood.score(),
            likelihood,
        }
    }

    pub fn from_score(score: f32) -> Self {
        Self {
            score,
            likelihood: Likelihood::from_score(score),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub description: String,
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topicality: Option<f32>,
}

/// A polygon vertex in image-relative coordinates (`0.0..=1.0`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedVertex {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub name: String,
    pub score: f32,
    #[serde(default)]
    pub bounding_box: Vec<NormalizedVertex>,
}

/// Output of the vision collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisionSignals {
    #[serde(default)]
    pub safe_search: BTreeMap<SafeSearchCategory, SafeSearchScore>,

    #[serde(default)]
    pub labels: Vec<Label>,

    #[serde(default)]
    pub detected_objects: Vec<DetectedObject>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
}

impl VisionSignals {
    pub fn with_safe_search(mut self, category: SafeSearchCategory, score: f32) -> Self {
        self.safe_search
            .insert(category, SafeSearchScore::from_score(score));
        self
    }

    pub fn with_label(mut self, description: &str, score: f32) -> Self {
        self.labels.push(Label {
            description: description.into(),
            score,
            topicality: None,
        });
        self
    }

    pub fn with_object(mut self, name: &str, score: f32) -> Self {
        self.detected_objects.push(DetectedObject {
            name: name.into(),
            score,
            bounding_box: Vec::new(),
        });
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text_content = Some(text.into());
        self
    }
}
