//! Socio moderation engine.
//!
//! [`ModerationEngine`] is the application context shared by the HTTP
//! gateway and the CLI. It owns the log store and cipher vault, applies the
//! text and image policies to collaborator signals, and serves recovery and
//! history lookups.

pub mod engine;
pub mod history;
pub mod recovery;

pub use engine::{
    DetectionReport, EngineStatus, ImageContext, ImageOutcome, ModerationEngine, TextOutcome,
};
pub use history::{DetectionSummary, EncryptionFileEntry, HistoryEntry};
pub use recovery::RecoveredContent;
