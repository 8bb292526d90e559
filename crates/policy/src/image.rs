//! Image policy: vision signals → severity tier, action, and blur radius.
//!
//! Flagging pass, in order:
//! 1. safe-search categories scoring at or above their threshold
//! 2. labels containing a concerning keyword (`concerning_label:<description>`)
//! 3. concerning objects (`concerning_object:<name>`)
//! 4. embedded text containing offensive terms (`offensive_text`)
//!
//! Tiering looks at the flags only: adult or violence is unsafe; racy or a
//! weapon is questionable; more than two minor flags are questionable; any
//! other flag is potentially concerning.

use serde::Serialize;
use socio_config::ImagePolicyConfig;
use socio_core::{ImageAction, SafeSearchCategory, SeverityTier, VisionSignals};
use tracing::debug;

use crate::format::flag_reason;

const OFFENSIVE_TEXT_FLAG: &str = "offensive_text";
const WEAPON_FLAG: &str = "concerning_object:Weapon";

/// Everything the image resolver decided about one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageAssessment {
    pub tier: SeverityTier,
    pub action: ImageAction,
    pub flags: Vec<String>,
    pub blur_radius: u32,
    pub reasons: Vec<String>,
    pub offensive_terms: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ImagePolicy {
    config: ImagePolicyConfig,
    keywords: Vec<String>,
    offensive_terms: Vec<String>,
}

impl Default for ImagePolicy {
    fn default() -> Self {
        Self::new(ImagePolicyConfig::default())
    }
}

impl ImagePolicy {
    pub fn new(config: ImagePolicyConfig) -> Self {
        let keywords = lowercase_all(&config.concerning_keywords);
        let offensive_terms = lowercase_all(&config.offensive_terms);
        Self {
            config,
            keywords,
            offensive_terms,
        }
    }

    pub fn resolve(&self, signals: &VisionSignals) -> ImageAssessment {
        let mut flags = Vec::new();

        for (category, score) in &signals.safe_search {
            if score.score >= self.config.thresholds.for_category(*category) {
                flags.push(category.as_str().to_string());
            }
        }

        for label in &signals.labels {
            let description = label.description.to_lowercase();
            if label.score > self.config.label_min_score
                && self.keywords.iter().any(|k| description.contains(k.as_str()))
            {
                flags.push(format!("concerning_label:{}", label.description));
            }
        }

        for object in &signals.detected_objects {
            if object.score > self.config.object_min_score
                && self.config.concerning_objects.contains(&object.name)
            {
                flags.push(format!("concerning_object:{}", object.name));
            }
        }

        let offensive_terms = self.offensive_terms_in(signals.text_content.as_deref());
        if !offensive_terms.is_empty() {
            flags.push(OFFENSIVE_TEXT_FLAG.to_string());
        }

        let tier = tier_for(&flags);
        let assessment = ImageAssessment {
            tier,
            action: self.action_for(tier),
            blur_radius: self.blur_radius_for(tier),
            reasons: flags.iter().map(|f| flag_reason(f)).collect(),
            flags,
            offensive_terms,
        };

        debug!(
            tier = %assessment.tier,
            action = %assessment.action,
            flags = assessment.flags.len(),
            "Image policy resolved"
        );
        assessment
    }

    pub fn action_for(&self, tier: SeverityTier) -> ImageAction {
        match tier {
            SeverityTier::Unsafe => ImageAction::Block,
            SeverityTier::Questionable => ImageAction::Blur,
            SeverityTier::PotentiallyConcerning => self.config.potentially_concerning_action,
            SeverityTier::Safe => ImageAction::Allow,
        }
    }

    pub fn blur_radius_for(&self, tier: SeverityTier) -> u32 {
        let blur = &self.config.blur;
        match tier {
            SeverityTier::Unsafe => blur.unsafe_tier,
            SeverityTier::Questionable => blur.questionable,
            SeverityTier::PotentiallyConcerning => blur.potentially_concerning,
            SeverityTier::Safe => blur.safe,
        }
    }

    /// Configured offensive terms found in `text`, in configuration order.
    fn offensive_terms_in(&self, text: Option<&str>) -> Vec<String> {
        let Some(text) = text.filter(|t| !t.is_empty()) else {
            return Vec::new();
        };
        let lowered = text.to_lowercase();
        self.offensive_terms
            .iter()
            .filter(|term| !term.is_empty() && lowered.contains(term.as_str()))
            .cloned()
            .collect()
    }
}

fn tier_for(flags: &[String]) -> SeverityTier {
    let has = |flag: &str| flags.iter().any(|f| f == flag);

    if flags.is_empty() {
        SeverityTier::Safe
    } else if has(SafeSearchCategory::Adult.as_str()) || has(SafeSearchCategory::Violence.as_str())
    {
        SeverityTier::Unsafe
    } else if has(SafeSearchCategory::Racy.as_str()) || has(WEAPON_FLAG) || flags.len() > 2 {
        SeverityTier::Questionable
    } else {
        SeverityTier::PotentiallyConcerning
    }
}

fn lowercase_all(terms: &[String]) -> Vec<String> {
    terms.iter().map(|t| t.to_lowercase()).collect()
}
