//! # Socio Core
//!
//! Domain types, collaborator traits, and error definitions for the Socio
//! content moderation engine. This crate has **no framework dependencies**:
//! it defines the model that every other crate implements against.
//!
//! ## Layout
//!
//! - [`signals`]: raw detection output from the text classifier and the
//!   vision collaborator
//! - [`moderation`]: actions and severity tiers the policy resolvers produce
//! - [`log`]: persisted log records and the [`LogStore`] trait
//! - [`detector`]: the [`TextDetector`] and [`VisionAnalyzer`] seams
//! - [`error`]: the error taxonomy shared by all crates

pub mod detector;
pub mod error;
pub mod log;
pub mod moderation;
pub mod signals;

// Re-export key types at crate root for ergonomics
pub use detector::{TextDetector, VisionAnalyzer};
pub use error::{CryptoError, Error, ErrorKind, Result, StoreError, UpstreamError};
pub use log::{
    EncryptionRecord, ImageLogEntry, LogId, LogKind, LogRecord, LogStore, ProcessingLogEntry,
};
pub use moderation::{ImageAction, SeverityTier, TextAction};
pub use signals::{
    DetectedObject, DetectionSignals, Label, Likelihood, NormalizedVertex, SafeSearchCategory,
    SafeSearchScore, VisionSignals,
};
