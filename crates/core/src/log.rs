//! Log records and the log store trait.
//!
//! Every processed request leaves exactly one record behind. Records are
//! append-only: a store assigns the id on [`LogStore::append`] and never
//! rewrites a record afterwards.
//!
//! Ids are derived from the record timestamp, `<prefix>_<YYYYmmdd_HHMMSS>`,
//! with a `_<n>` suffix when several records land in the same second.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::StoreError;
use crate::moderation::{ImageAction, SeverityTier, TextAction};
use crate::signals::DetectionSignals;

const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const STAMP_LEN: usize = 15;

/// The family a record belongs to; determines its id prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Processing,
    Encryption,
    Image,
}

impl LogKind {
    pub const ALL: [LogKind; 3] = [Self::Processing, Self::Encryption, Self::Image];

    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Processing => "processing_log",
            Self::Encryption => "encryption_log",
            Self::Image => "image_log",
        }
    }
}

/// A parsed log reference.
///
/// A `LogId` can only be built from a kind, a timestamp, and a sequence
/// number, or parsed from a string matching that exact grammar, so it never
/// contains path separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogId {
    kind: LogKind,
    stamp: String,
    seq: u32,
}

impl LogId {
    pub fn new(kind: LogKind, timestamp: &DateTime<Utc>, seq: u32) -> Self {
        Self {
            kind,
            stamp: timestamp.format(STAMP_FORMAT).to_string(),
            seq,
        }
    }

    /// The same instant with the next collision suffix.
    pub fn next(&self) -> Self {
        Self {
            kind: self.kind,
            stamp: self.stamp.clone(),
            seq: self.seq + 1,
        }
    }

    pub fn kind(&self) -> LogKind {
        self.kind
    }

    pub fn seq(&self) -> u32 {
        self.seq
    }

    /// Parse a bare id such as `processing_log_20250102_030405_2`.
    pub fn parse(raw: &str) -> Option<Self> {
        LogKind::ALL.iter().find_map(|kind| {
            let rest = raw.strip_prefix(kind.prefix())?.strip_prefix('_')?;
            if rest.len() < STAMP_LEN || !rest.is_char_boundary(STAMP_LEN) {
                return None;
            }
            let (stamp, tail) = rest.split_at(STAMP_LEN);
            if !is_valid_stamp(stamp) {
                return None;
            }
            let seq = match tail {
                "" => 0,
                _ => {
                    let digits = tail.strip_prefix('_')?;
                    // One canonical spelling per id: no leading zeros.
                    if digits.is_empty()
                        || digits.starts_with('0')
                        || !digits.bytes().all(|b| b.is_ascii_digit())
                    {
                        return None;
                    }
                    digits.parse().ok().filter(|n| *n > 0)?
                }
            };
            Some(Self {
                kind: *kind,
                stamp: stamp.to_string(),
                seq,
            })
        })
    }
}

fn is_valid_stamp(stamp: &str) -> bool {
    stamp.bytes().enumerate().all(|(i, b)| match i {
        8 => b == b'_',
        _ => b.is_ascii_digit(),
    })
}

impl std::fmt::Display for LogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.seq {
            0 => write!(f, "{}_{}", self.kind.prefix(), self.stamp),
            n => write!(f, "{}_{}_{}", self.kind.prefix(), self.stamp, n),
        }
    }
}

/// Chronological order: timestamp, then collision suffix.
impl Ord for LogId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.stamp
            .cmp(&other.stamp)
            .then(self.seq.cmp(&other.seq))
            .then(self.kind.prefix().cmp(other.kind.prefix()))
    }
}

impl PartialOrd for LogId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One processed text request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingLogEntry {
    /// Assigned by the store on append.
    #[serde(default)]
    pub id: String,

    pub timestamp: DateTime<Utc>,

    /// The submitted text. Absent for `encrypt` actions, whose original
    /// only exists as ciphertext in the linked encryption record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,

    pub processed: String,

    pub detection_results: DetectionSignals,

    /// Id of the encryption record for `encrypt` actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_ref: Option<String>,

    pub action: TextAction,

    #[serde(default)]
    pub reasons: Vec<String>,
}

/// Ciphertext of one encrypted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptionRecord {
    #[serde(default)]
    pub id: String,

    pub timestamp: DateTime<Utc>,

    /// `base64(nonce || ciphertext || tag)` from the cipher vault.
    #[serde(default)]
    pub encrypted: String,

    /// Plaintext, only present in records written by deployments that kept
    /// it next to the ciphertext. New records never set it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
}

/// One processed image request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageLogEntry {
    #[serde(default)]
    pub id: String,

    pub timestamp: DateTime<Utc>,

    pub image_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,

    pub action: ImageAction,

    pub tier: SeverityTier,

    #[serde(default)]
    pub flags: Vec<String>,

    #[serde(default)]
    pub reasons: Vec<String>,

    #[serde(default)]
    pub blur_radius: u32,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub offensive_terms: Vec<String>,
}

/// A persisted record, tagged with its kind so files are self-describing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogRecord {
    Processing(ProcessingLogEntry),
    Encryption(EncryptionRecord),
    Image(ImageLogEntry),
}

impl LogRecord {
    pub fn kind(&self) -> LogKind {
        match self {
            Self::Processing(_) => LogKind::Processing,
            Self::Encryption(_) => LogKind::Encryption,
            Self::Image(_) => LogKind::Image,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Processing(e) => &e.id,
            Self::Encryption(e) => &e.id,
            Self::Image(e) => &e.id,
        }
    }

    pub fn set_id(&mut self, id: &LogId) {
        let id = id.to_string();
        match self {
            Self::Processing(e) => e.id = id,
            Self::Encryption(e) => e.id = id,
            Self::Image(e) => e.id = id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Processing(e) => e.timestamp,
            Self::Encryption(e) => e.timestamp,
            Self::Image(e) => e.timestamp,
        }
    }

    /// The id this record would get without a collision.
    pub fn base_id(&self) -> LogId {
        LogId::new(self.kind(), &self.timestamp(), 0)
    }
}

/// Append-only storage of log records.
///
/// Implementations: file-backed (one JSON file per record) and in-memory.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// The backend name (e.g., "file", "in_memory").
    fn name(&self) -> &str;

    /// Persist a record under a fresh, unique id and return that id.
    async fn append(&self, record: LogRecord) -> std::result::Result<LogId, StoreError>;

    /// Fetch a record by reference.
    ///
    /// The reference is sanitized first; anything that is not a bare log id
    /// is reported as not found.
    async fn get(&self, reference: &str) -> std::result::Result<LogRecord, StoreError>;

    /// All records of a kind, newest first. Unreadable records are skipped.
    async fn list(&self, kind: LogKind) -> std::result::Result<Vec<LogRecord>, StoreError>;

    /// Total record count across all kinds.
    async fn count(&self) -> std::result::Result<usize, StoreError>;

    /// Remove a record written by a request that then failed.
    ///
    /// Only for rolling back a partial write; the log is otherwise
    /// append-only. The reference is sanitized like `get`.
    async fn discard(&self, reference: &str) -> std::result::Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn id_formats_with_and_without_suffix() {
        let id = LogId::new(LogKind::Processing, &ts(), 0);
        assert_eq!(id.to_string(), "processing_log_20250102_030405");
        assert_eq!(id.next().to_string(), "processing_log_20250102_030405_1");
    }

    #[test]
    fn id_parse_roundtrips() {
        for raw in [
            "encryption_log_20250102_030405",
            "image_log_20250102_030405_12",
        ] {
            let id = LogId::parse(raw).unwrap();
            assert_eq!(id.to_string(), raw);
        }
    }

    #[test]
    fn id_parse_rejects_malformed() {
        for raw in [
            "",
            "processing_log_",
            "processing_log_2025010_030405",
            "processing_log_20250102-030405",
            "processing_log_20250102_030405_",
            "processing_log_20250102_030405_0",
            "processing_log_20250102_030405_x",
            "processing_log_20250102_030405/../x",
            "../processing_log_20250102_030405",
            "audit_log_20250102_030405",
        ] {
            assert!(LogId::parse(raw).is_none(), "accepted {raw:?}");
        }
    }

    #[test]
    fn id_parse_rejects_zero_padded_suffix() {
        for raw in [
            "encryption_log_20250102_030405_01",
            "encryption_log_20250102_030405_0001",
            "encryption_log_20250102_030405_00",
        ] {
            assert!(LogId::parse(raw).is_none(), "accepted {raw:?}");
        }
        let id = LogId::parse("encryption_log_20250102_030405_10").unwrap();
        assert_eq!(id.to_string(), "encryption_log_20250102_030405_10");
    }

    #[test]
    fn ids_order_numerically_by_suffix() {
        let base = LogId::new(LogKind::Processing, &ts(), 0);
        let mut ids = vec![
            LogId::parse("processing_log_20250102_030405_10").unwrap(),
            base.clone(),
            LogId::parse("processing_log_20250102_030405_2").unwrap(),
            LogId::parse("processing_log_20250101_235959").unwrap(),
        ];
        ids.sort();
        let rendered: Vec<String> = ids.iter().map(|i| i.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "processing_log_20250101_235959",
                "processing_log_20250102_030405",
                "processing_log_20250102_030405_2",
                "processing_log_20250102_030405_10",
            ]
        );
    }

    #[test]
    fn record_is_tagged_with_kind() {
        let record = LogRecord::Encryption(EncryptionRecord {
            id: String::new(),
            timestamp: ts(),
            encrypted: "abc".into(),
            original: None,
        });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "encryption");
        assert!(json.get("original").is_none());
        let back: LogRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind(), LogKind::Encryption);
    }

    #[test]
    fn set_id_updates_record() {
        let mut record = LogRecord::Processing(ProcessingLogEntry {
            id: String::new(),
            timestamp: ts(),
            original: Some("hi".into()),
            processed: "hi".into(),
            detection_results: DetectionSignals::default(),
            encryption_ref: None,
            action: TextAction::Keep,
            reasons: vec![],
        });
        let id = record.base_id().next();
        record.set_id(&id);
        assert_eq!(record.id(), "processing_log_20250102_030405_1");
    }
}
