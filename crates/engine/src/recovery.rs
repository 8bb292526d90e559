//! Recovery of encrypted originals from a log reference.
//!
//! Accepted references: a processing entry for an `encrypt` action (followed
//! to its encryption record) or an encryption record itself. Anything else is
//! not found or not recoverable. Every attempt lands in the audit log.

use serde::Serialize;
use socio_core::{EncryptionRecord, Error, LogRecord, StoreError};
use socio_security::{AuditEvent, AuditOutcome, sanitize_reference};
use tracing::{info, warn};

use crate::engine::{AUDIT_ACTOR, ModerationEngine};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveredContent {
    pub original_text: String,
}

impl ModerationEngine {
    /// Reconstruct the original text behind `reference`.
    pub async fn recover_content(&self, reference: &str) -> Result<RecoveredContent, Error> {
        let stem = match sanitize_reference(reference) {
            Ok(stem) => stem,
            Err(e) => {
                warn!(error = %e, "Rejected log reference");
                self.audit.log(
                    AuditEvent::ReferenceRejected {
                        reference: reference.into(),
                    },
                    AUDIT_ACTOR,
                    reference,
                    AuditOutcome::Denied,
                    Some(e.to_string()),
                );
                return Err(Error::NotFound(reference.to_string()));
            }
        };

        let result = self.recover_original(stem).await;

        let (outcome, details) = match &result {
            Ok(_) => (AuditOutcome::Success, None),
            Err(e) => (AuditOutcome::Failure, Some(e.kind().to_string())),
        };
        self.audit.log(
            AuditEvent::RecoveryAttempt {
                reference: stem.into(),
            },
            AUDIT_ACTOR,
            stem,
            outcome,
            details,
        );

        let original_text = result?;
        info!(reference = %stem, "Content recovered");
        Ok(RecoveredContent { original_text })
    }

    async fn recover_original(&self, reference: &str) -> Result<String, Error> {
        let record = match self.store.get(reference).await? {
            LogRecord::Encryption(record) => record,
            LogRecord::Processing(entry) => {
                let Some(encryption_ref) = entry.encryption_ref else {
                    return Err(Error::invalid_record(
                        entry.id,
                        format!("'{}' action has no recoverable original", entry.action),
                    ));
                };
                self.linked_encryption_record(&entry.id, &encryption_ref)
                    .await?
            }
            LogRecord::Image(entry) => {
                return Err(Error::invalid_record(
                    entry.id,
                    "image records hold no recoverable text",
                ));
            }
        };

        if !record.encrypted.is_empty() {
            return Ok(self.vault.decrypt(&record.encrypted)?);
        }
        record.original.ok_or_else(|| {
            Error::invalid_record(record.id, "record holds neither ciphertext nor plaintext")
        })
    }

    async fn linked_encryption_record(
        &self,
        entry_id: &str,
        encryption_ref: &str,
    ) -> Result<EncryptionRecord, Error> {
        match self.store.get(encryption_ref).await {
            Ok(LogRecord::Encryption(record)) => Ok(record),
            Ok(other) => Err(Error::invalid_record(
                entry_id,
                format!("'{}' is not an encryption record", other.id()),
            )),
            Err(StoreError::NotFound(_)) => Err(Error::invalid_record(
                entry_id,
                format!("linked encryption record '{encryption_ref}' is missing"),
            )),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedDetector, engine_with, timestamp};
    use socio_core::{
        DetectionSignals, ImageAction, ImageLogEntry, LogStore, ProcessingLogEntry, SeverityTier,
        TextAction,
    };

    fn email_detector(text: &str) -> ScriptedDetector {
        ScriptedDetector::new().on(
            text,
            DetectionSignals::default().with_sensitive("email", &["jane@example.com"]),
        )
    }

    #[tokio::test]
    async fn recover_via_processing_reference() {
        let text = "write to jane@example.com";
        let (engine, _store) = engine_with(email_detector(text));
        let outcome = engine.process_text(text).await.unwrap();

        let recovered = engine.recover_content(&outcome.log_reference).await.unwrap();
        assert_eq!(recovered.original_text, text);
    }

    #[tokio::test]
    async fn recover_via_encryption_reference_with_extension() {
        let text = "write to jane@example.com";
        let (engine, _store) = engine_with(email_detector(text));
        let outcome = engine.process_text(text).await.unwrap();
        let reference = format!("{}.json", outcome.encryption_reference.unwrap());

        let recovered = engine.recover_content(&reference).await.unwrap();
        assert_eq!(recovered.original_text, text);
    }

    #[tokio::test]
    async fn traversal_is_not_found_and_audited() {
        let (engine, _store) = engine_with(ScriptedDetector::new());
        let err = engine.recover_content("../../etc/passwd").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let denied = engine.audit().entries_by_outcome(&AuditOutcome::Denied);
        assert_eq!(denied.len(), 1);
        assert_eq!(
            denied[0].event,
            AuditEvent::ReferenceRejected {
                reference: "../../etc/passwd".into()
            }
        );
    }

    #[tokio::test]
    async fn unknown_reference_is_not_found() {
        let (engine, _store) = engine_with(ScriptedDetector::new());
        for reference in ["encryption_log_20250102_030405", "notes", ""] {
            let err = engine.recover_content(reference).await.unwrap_err();
            assert!(matches!(err, Error::NotFound(_)), "{reference:?}: {err}");
        }
        assert_eq!(
            engine.audit().entries_by_outcome(&AuditOutcome::Failure).len(),
            2
        );
    }

    #[tokio::test]
    async fn removed_text_is_not_recoverable() {
        let detector = ScriptedDetector::new().on(
            "darn it",
            DetectionSignals {
                profanity: true,
                ..Default::default()
            },
        );
        let (engine, _store) = engine_with(detector);
        let outcome = engine.process_text("darn it").await.unwrap();
        assert_eq!(outcome.action, TextAction::Remove);

        let err = engine.recover_content(&outcome.log_reference).await.unwrap_err();
        assert_eq!(err.kind().as_str(), "invalid_record");
        assert!(err.to_string().contains("remove"));
    }

    #[tokio::test]
    async fn image_reference_is_invalid() {
        let (engine, store) = engine_with(ScriptedDetector::new());
        let id = store
            .append(LogRecord::Image(ImageLogEntry {
                id: String::new(),
                timestamp: timestamp(1),
                image_url: "https://img.example/a.png".into(),
                page_url: None,
                action: ImageAction::Allow,
                tier: SeverityTier::Safe,
                flags: vec![],
                reasons: vec![],
                blur_radius: 0,
                offensive_terms: vec![],
            }))
            .await
            .unwrap();

        let err = engine.recover_content(&id.to_string()).await.unwrap_err();
        assert_eq!(err.kind().as_str(), "invalid_record");
    }

    #[tokio::test]
    async fn legacy_plaintext_record_is_recovered() {
        let (engine, store) = engine_with(ScriptedDetector::new());
        let id = store
            .append(LogRecord::Encryption(EncryptionRecord {
                id: String::new(),
                timestamp: timestamp(2),
                encrypted: String::new(),
                original: Some("old plaintext".into()),
            }))
            .await
            .unwrap();

        let recovered = engine.recover_content(&id.to_string()).await.unwrap();
        assert_eq!(recovered.original_text, "old plaintext");
    }

    #[tokio::test]
    async fn empty_record_is_invalid() {
        let (engine, store) = engine_with(ScriptedDetector::new());
        let id = store
            .append(LogRecord::Encryption(EncryptionRecord {
                id: String::new(),
                timestamp: timestamp(3),
                encrypted: String::new(),
                original: None,
            }))
            .await
            .unwrap();

        let err = engine.recover_content(&id.to_string()).await.unwrap_err();
        assert_eq!(err.kind().as_str(), "invalid_record");
    }

    #[tokio::test]
    async fn tampered_ciphertext_is_crypto_error() {
        let (engine, store) = engine_with(ScriptedDetector::new());
        let mut encrypted = engine.vault().encrypt("secret").unwrap();
        encrypted.replace_range(20..24, "AAAA");
        let id = store
            .append(LogRecord::Encryption(EncryptionRecord {
                id: String::new(),
                timestamp: timestamp(4),
                encrypted,
                original: Some("ignored when ciphertext is present".into()),
            }))
            .await
            .unwrap();

        let err = engine.recover_content(&id.to_string()).await.unwrap_err();
        assert_eq!(err.kind().as_str(), "crypto_error");
        assert!(!err.to_string().contains("secret"));
    }

    #[tokio::test]
    async fn dangling_encryption_link_is_invalid() {
        let (engine, store) = engine_with(ScriptedDetector::new());
        let id = store
            .append(LogRecord::Processing(ProcessingLogEntry {
                id: String::new(),
                timestamp: timestamp(5),
                original: None,
                processed: "[Encrypted content]".into(),
                detection_results: DetectionSignals::default(),
                encryption_ref: Some("encryption_log_20250102_030459".into()),
                action: TextAction::Encrypt,
                reasons: vec!["Email detected".into()],
            }))
            .await
            .unwrap();

        let err = engine.recover_content(&id.to_string()).await.unwrap_err();
        assert_eq!(err.kind().as_str(), "invalid_record");
        assert!(err.to_string().contains("missing"));
    }
}
