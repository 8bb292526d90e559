//! The moderation engine: one application context owning the vault, the
//! log store, both policy resolvers, and the detection collaborators.
//!
//! Request flow for text: detect → resolve → redact → log. For `encrypt`
//! the original is sealed by the vault and written as its own encryption
//! record before the processing entry that links to it. If the processing
//! entry cannot be written, that encryption record is discarded again.

use chrono::{DateTime, Utc};
use serde::Serialize;
use socio_config::AppConfig;
use socio_core::{
    DetectionSignals, EncryptionRecord, Error, ImageAction, ImageLogEntry, LogRecord, LogStore,
    ProcessingLogEntry, SeverityTier, TextAction, TextDetector, UpstreamError, VisionAnalyzer,
    VisionSignals,
};
use socio_policy::{ImagePolicy, TextPolicy};
use socio_providers::{GoogleVisionAnalyzer, LexiconDetector};
use socio_security::{AuditEvent, AuditLogger, AuditOutcome, CipherVault, KeyOrigin, TracingSink};
use socio_store::FileLogStore;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Actor name recorded in audit entries written by the engine.
pub(crate) const AUDIT_ACTOR: &str = "engine";

/// Stand-in for matched spans in stored detection results of encrypted text.
const REDACTED_SPAN: &str = "[redacted]";

/// Result of processing one piece of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextOutcome {
    pub processed_text: String,
    pub action: TextAction,
    pub reasons: Vec<String>,
    /// Id of the processing entry; recovery accepts it for `encrypt` actions.
    pub log_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_reference: Option<String>,
}

/// Where an image was seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageContext {
    pub image_url: String,
    pub page_url: Option<String>,
}

impl ImageContext {
    pub fn new(image_url: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            page_url: None,
        }
    }

    pub fn with_page_url(mut self, page_url: impl Into<String>) -> Self {
        self.page_url = Some(page_url.into());
        self
    }
}

/// Result of processing one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageOutcome {
    pub action: ImageAction,
    pub severity_tier: SeverityTier,
    pub flags: Vec<String>,
    pub blur_radius: u32,
    pub reasons: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub offensive_terms: Vec<String>,
    pub log_reference: String,
}

/// Detection output and the action it would lead to, without side effects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionReport {
    pub detection_results: DetectionSignals,
    pub determined_action: TextAction,
    pub reasons: Vec<String>,
}

/// Snapshot for status and debug endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStatus {
    pub log_files: usize,
    pub key_fingerprint: String,
    pub detector: String,
    pub store: String,
    pub vision_analyzer: Option<String>,
}

pub struct ModerationEngine {
    pub(crate) store: Arc<dyn LogStore>,
    pub(crate) vault: Arc<CipherVault>,
    pub(crate) audit: Arc<AuditLogger>,
    text_policy: TextPolicy,
    image_policy: ImagePolicy,
    detector: Arc<dyn TextDetector>,
    analyzer: Option<Arc<dyn VisionAnalyzer>>,
}

impl std::fmt::Debug for ModerationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModerationEngine")
            .field("store", &self.store.name())
            .field("vault", &self.vault)
            .field("detector", &self.detector.name())
            .field("analyzer", &self.analyzer.as_ref().map(|a| a.name()))
            .finish_non_exhaustive()
    }
}

impl ModerationEngine {
    /// Create an engine with default policies and no vision analyzer.
    pub fn new(
        store: Arc<dyn LogStore>,
        vault: Arc<CipherVault>,
        detector: Arc<dyn TextDetector>,
    ) -> Self {
        Self {
            store,
            vault,
            audit: Arc::new(AuditLogger::new()),
            text_policy: TextPolicy::default(),
            image_policy: ImagePolicy::default(),
            detector,
            analyzer: None,
        }
    }

    pub fn with_text_policy(mut self, policy: TextPolicy) -> Self {
        self.text_policy = policy;
        self
    }

    pub fn with_image_policy(mut self, policy: ImagePolicy) -> Self {
        self.image_policy = policy;
        self
    }

    /// Attach the collaborator used by [`ModerationEngine::analyze_image`].
    pub fn with_analyzer(mut self, analyzer: Arc<dyn VisionAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn with_audit(mut self, audit: Arc<AuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    /// Build the production engine: file log store, persisted vault key,
    /// lexicon detector, and Google Vision when an API key is configured.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let store = FileLogStore::new(&config.storage.log_dir)?;
        let vault = CipherVault::initialize(&config.storage.key_file)?;
        let audit = Arc::new(AuditLogger::with_sinks(vec![Box::new(TracingSink)]));

        if vault.origin() == KeyOrigin::Generated {
            audit.log(
                AuditEvent::KeyGenerated {
                    fingerprint: vault.fingerprint().to_string(),
                },
                AUDIT_ACTOR,
                &config.storage.key_file.display().to_string(),
                AuditOutcome::Success,
                None,
            );
        }

        let detector = LexiconDetector::new(&config.detector)?;
        let mut engine = Self::new(Arc::new(store), Arc::new(vault), Arc::new(detector))
            .with_text_policy(TextPolicy::new(&config.text))
            .with_image_policy(ImagePolicy::new(config.image.clone()))
            .with_audit(audit);

        match GoogleVisionAnalyzer::from_config(&config.vision) {
            Ok(analyzer) => engine = engine.with_analyzer(Arc::new(analyzer)),
            Err(UpstreamError::NotConfigured(reason)) => {
                info!(%reason, "Image analysis disabled");
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            log_dir = %config.storage.log_dir.display(),
            fingerprint = %engine.vault.fingerprint(),
            vision = engine.analyzer.is_some(),
            "Moderation engine ready"
        );
        Ok(engine)
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn vault(&self) -> &CipherVault {
        &self.vault
    }

    pub fn has_analyzer(&self) -> bool {
        self.analyzer.is_some()
    }

    /// Detect, decide, redact, and log one piece of text.
    pub async fn process_text(&self, text: &str) -> Result<TextOutcome, Error> {
        let signals = self.detector.detect(text).await?;
        let decision = self.text_policy.resolve(&signals);
        let timestamp = Utc::now();

        let (processed_text, encryption_ref) =
            self.redact(text, decision.action, timestamp).await?;

        let encrypted = decision.action == TextAction::Encrypt;
        let entry = ProcessingLogEntry {
            id: String::new(),
            timestamp,
            original: (!encrypted).then(|| text.to_string()),
            processed: processed_text.clone(),
            detection_results: if encrypted {
                redact_spans(&signals)
            } else {
                signals
            },
            encryption_ref: encryption_ref.clone(),
            action: decision.action,
            reasons: decision.reasons.clone(),
        };
        let id = match self.store.append(LogRecord::Processing(entry)).await {
            Ok(id) => id,
            Err(e) => {
                if let Some(record_id) = &encryption_ref {
                    self.discard_encryption(record_id).await;
                }
                return Err(e.into());
            }
        };

        info!(
            id = %id,
            action = %decision.action,
            chars = text.chars().count(),
            reasons = decision.reasons.len(),
            "Text processed"
        );

        Ok(TextOutcome {
            processed_text,
            action: decision.action,
            reasons: decision.reasons,
            log_reference: id.to_string(),
            encryption_reference: encryption_ref,
        })
    }

    /// Apply `action` to `text`. For `encrypt`, seal the original and append
    /// its encryption record, returning the record id alongside the
    /// placeholder. Any failure fails the whole call.
    pub async fn redact(
        &self,
        text: &str,
        action: TextAction,
        timestamp: DateTime<Utc>,
    ) -> Result<(String, Option<String>), Error> {
        let processed = self.text_policy.render(text, action);
        if action != TextAction::Encrypt {
            return Ok((processed, None));
        }

        let encrypted = self.vault.encrypt(text)?;
        let record = EncryptionRecord {
            id: String::new(),
            timestamp,
            encrypted,
            original: None,
        };
        let id = self.store.append(LogRecord::Encryption(record)).await?;

        self.audit.log(
            AuditEvent::ContentEncrypted {
                record_id: id.to_string(),
            },
            AUDIT_ACTOR,
            &id.to_string(),
            AuditOutcome::Success,
            None,
        );
        debug!(id = %id, "Encryption record written");
        Ok((processed, Some(id.to_string())))
    }

    /// Roll back an encryption record whose processing entry was never
    /// written, so no unlinked ciphertext stays recoverable.
    async fn discard_encryption(&self, record_id: &str) {
        let (outcome, details) = match self.store.discard(record_id).await {
            Ok(()) => {
                warn!(id = %record_id, "Discarded encryption record of failed request");
                (AuditOutcome::Success, None)
            }
            Err(e) => {
                error!(id = %record_id, error = %e, "Failed to discard encryption record");
                (AuditOutcome::Failure, Some(e.to_string()))
            }
        };
        self.audit.log(
            AuditEvent::EncryptionDiscarded {
                record_id: record_id.to_string(),
            },
            AUDIT_ACTOR,
            record_id,
            outcome,
            details,
        );
    }

    /// Decide on an image from already-collected vision signals and log it.
    pub async fn process_image(
        &self,
        signals: &VisionSignals,
        context: ImageContext,
    ) -> Result<ImageOutcome, Error> {
        let assessment = self.image_policy.resolve(signals);

        let entry = ImageLogEntry {
            id: String::new(),
            timestamp: Utc::now(),
            image_url: context.image_url,
            page_url: context.page_url,
            action: assessment.action,
            tier: assessment.tier,
            flags: assessment.flags.clone(),
            reasons: assessment.reasons.clone(),
            blur_radius: assessment.blur_radius,
            offensive_terms: assessment.offensive_terms.clone(),
        };
        let id = self.store.append(LogRecord::Image(entry)).await?;

        info!(
            id = %id,
            tier = %assessment.tier,
            action = %assessment.action,
            flags = assessment.flags.len(),
            "Image processed"
        );

        Ok(ImageOutcome {
            action: assessment.action,
            severity_tier: assessment.tier,
            flags: assessment.flags,
            blur_radius: assessment.blur_radius,
            reasons: assessment.reasons,
            offensive_terms: assessment.offensive_terms,
            log_reference: id.to_string(),
        })
    }

    /// Ask the vision collaborator about `image_url`, then process the result.
    ///
    /// A collaborator failure is returned as-is; it never turns into `allow`.
    pub async fn analyze_image(
        &self,
        image_url: &str,
        page_url: Option<&str>,
    ) -> Result<ImageOutcome, Error> {
        let analyzer = self.analyzer.as_ref().ok_or_else(|| {
            UpstreamError::NotConfigured("no vision analyzer is configured".into())
        })?;

        let signals = analyzer.analyze(image_url).await?;
        let mut context = ImageContext::new(image_url);
        context.page_url = page_url.map(str::to_string);
        self.process_image(&signals, context).await
    }

    /// Run detection and the text policy without writing anything.
    pub async fn test_detection(&self, text: &str) -> Result<DetectionReport, Error> {
        let detection_results = self.detector.detect(text).await?;
        let decision = self.text_policy.resolve(&detection_results);
        Ok(DetectionReport {
            detection_results,
            determined_action: decision.action,
            reasons: decision.reasons,
        })
    }

    pub async fn status(&self) -> Result<EngineStatus, Error> {
        Ok(EngineStatus {
            log_files: self.store.count().await?,
            key_fingerprint: self.vault.fingerprint().to_string(),
            detector: self.detector.name().to_string(),
            store: self.store.name().to_string(),
            vision_analyzer: self.analyzer.as_ref().map(|a| a.name().to_string()),
        })
    }
}

/// Detection results safe to store next to a placeholder: category names
/// survive, matched spans do not.
fn redact_spans(signals: &DetectionSignals) -> DetectionSignals {
    DetectionSignals {
        hate_speech: signals.hate_speech,
        profanity: signals.profanity,
        sensitive_info: signals
            .sensitive_info
            .iter()
            .map(|(category, spans)| {
                (
                    category.clone(),
                    vec![REDACTED_SPAN.to_string(); spans.len()],
                )
            })
            .collect(),
    }
}
