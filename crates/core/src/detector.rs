//! Collaborator traits: where raw detection signals come from.
//!
//! The engine never classifies content itself. It asks a [`TextDetector`]
//! for text signals and a [`VisionAnalyzer`] for image signals, then applies
//! policy to whatever they return.
//!
//! Implementations: lexicon/regex text detection, Google Cloud Vision, and
//! scripted doubles in tests.

use async_trait::async_trait;

use crate::error::UpstreamError;
use crate::signals::{DetectionSignals, VisionSignals};

/// Produces [`DetectionSignals`] for a piece of text.
#[async_trait]
pub trait TextDetector: Send + Sync {
    /// The detector name (e.g., "lexicon").
    fn name(&self) -> &str;

    async fn detect(&self, text: &str) -> std::result::Result<DetectionSignals, UpstreamError>;
}

/// Produces [`VisionSignals`] for an image reference.
#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    /// The analyzer name (e.g., "google_vision").
    fn name(&self) -> &str;

    /// Analyze the image at `image_url` (an `http(s)` or `data:` URL).
    async fn analyze(&self, image_url: &str) -> std::result::Result<VisionSignals, UpstreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedDetector(DetectionSignals);

    #[async_trait]
    impl TextDetector for FixedDetector {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn detect(&self, _text: &str) -> Result<DetectionSignals, UpstreamError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn detector_is_object_safe() {
        let detector: Box<dyn TextDetector> = Box::new(FixedDetector(DetectionSignals {
            hate_speech: true,
            ..Default::default()
        }));
        let signals = detector.detect("anything").await.unwrap();
        assert!(signals.hate_speech);
        assert_eq!(detector.name(), "fixed");
    }
}
