//! History views over the log store for the extension's popup.

use chrono::{DateTime, Utc};
use serde::Serialize;
use socio_core::{Error, LogKind, LogRecord, TextAction};

use crate::engine::ModerationEngine;

/// What the detector saw, without any matched content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionSummary {
    pub hate_speech: bool,
    pub profanity: bool,
    pub sensitive_categories: Vec<String>,
}

/// One processed text request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub action: TextAction,
    pub reasons: Vec<String>,
    pub detection_summary: DetectionSummary,
}

/// One encryption record, listed for recovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncryptionFileEntry {
    pub filename: String,
    pub timestamp: DateTime<Utc>,
    pub content_type: &'static str,
}

impl ModerationEngine {
    /// Processing log summaries, newest first.
    pub async fn history(&self) -> Result<Vec<HistoryEntry>, Error> {
        let records = self.store.list(LogKind::Processing).await?;
        Ok(records
            .into_iter()
            .filter_map(|record| match record {
                LogRecord::Processing(entry) => Some(HistoryEntry {
                    detection_summary: DetectionSummary {
                        hate_speech: entry.detection_results.hate_speech,
                        profanity: entry.detection_results.profanity,
                        sensitive_categories: entry
                            .detection_results
                            .flagged_categories()
                            .map(str::to_string)
                            .collect(),
                    },
                    id: entry.id,
                    timestamp: entry.timestamp,
                    action: entry.action,
                    reasons: entry.reasons,
                }),
                _ => None,
            })
            .collect())
    }

    /// Encryption records, newest first.
    pub async fn encryption_files(&self) -> Result<Vec<EncryptionFileEntry>, Error> {
        let records = self.store.list(LogKind::Encryption).await?;
        Ok(records
            .iter()
            .map(|record| EncryptionFileEntry {
                filename: format!("{}.json", record.id()),
                timestamp: record.timestamp(),
                content_type: "text",
            })
            .collect())
    }
}
