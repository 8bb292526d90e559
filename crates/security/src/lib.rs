//! Security module for Socio: the cipher vault, log-reference
//! sanitization, and audit logging.
//!
//! Provides:
//! - **Cipher vault**: AES-256-GCM encryption of redacted text at rest
//! - **Reference sanitization**: log references can never escape the log directory
//! - **Audit logging**: structured security event logging

pub mod audit;
pub mod path;
pub mod vault;

pub use audit::{AuditEntry, AuditEvent, AuditLogger, AuditOutcome, AuditSink, TracingSink};
pub use path::{sanitize_reference, ReferenceError};
pub use vault::{CipherVault, KeyOrigin};
