//! Error types for the Socio domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum, rolled up into [`Error`].

use thiserror::Error;

/// The top-level error type for all Socio operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Cipher vault ---
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    // --- Log store ---
    #[error("Log reference not found: {0}")]
    NotFound(String),

    #[error("Invalid record '{id}': {reason}")]
    InvalidRecord { id: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),

    // --- External collaborators ---
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable, machine-readable classification of an [`Error`].
///
/// Surfaced to clients as the `kind` field of structured error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Crypto,
    NotFound,
    InvalidRecord,
    Storage,
    Upstream,
    Config,
    Serialization,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crypto => "crypto_error",
            Self::NotFound => "not_found",
            Self::InvalidRecord => "invalid_record",
            Self::Storage => "storage_error",
            Self::Upstream => "upstream_error",
            Self::Config => "config_error",
            Self::Serialization => "serialization_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Crypto(_) => ErrorKind::Crypto,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidRecord { .. } => ErrorKind::InvalidRecord,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Upstream(_) => ErrorKind::Upstream,
            Self::Config { .. } => ErrorKind::Config,
            Self::Serialization(_) => ErrorKind::Serialization,
        }
    }

    pub fn invalid_record(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::Corrupt { id, reason } => Self::InvalidRecord { id, reason },
            other => Self::Storage(other.to_string()),
        }
    }
}

// --- Bounded context errors ---

/// Cipher vault failures.
///
/// Messages never carry key material or plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("encryption key file could not be accessed: {0}")]
    KeyIo(String),

    #[error("encryption key is corrupt or has the wrong length")]
    KeyCorrupt,

    #[error("encryption failed")]
    EncryptionFailed,

    #[error("ciphertext is not valid base64 or is truncated")]
    MalformedCiphertext,

    #[error("decryption failed: data was tampered with or encrypted under a different key")]
    DecryptionFailed,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("record '{id}' could not be parsed: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("log storage I/O failed: {0}")]
    Io(String),

    #[error("record serialization failed: {0}")]
    Serialization(String),
}

/// Failures of the external detector or vision collaborator.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Collaborator not configured: {0}")]
    NotConfigured(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_maps_to_not_found_kind() {
        let err: Error = StoreError::NotFound("processing_log_x".into()).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.kind().as_str(), "not_found");
    }

    #[test]
    fn corrupt_record_maps_to_invalid_record() {
        let err: Error = StoreError::Corrupt {
            id: "encryption_log_20250101_000000".into(),
            reason: "missing field".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InvalidRecord);
        assert!(err.to_string().contains("encryption_log_20250101_000000"));
    }

    #[test]
    fn io_failure_maps_to_storage() {
        let err: Error = StoreError::Io("disk full".into()).into();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }

    #[test]
    fn crypto_error_does_not_leak_details() {
        let err = Error::Crypto(CryptoError::DecryptionFailed);
        assert_eq!(err.kind().as_str(), "crypto_error");
        assert!(err.to_string().contains("tampered"));
    }

    #[test]
    fn upstream_error_displays_status() {
        let err = Error::Upstream(UpstreamError::ApiError {
            status_code: 403,
            message: "quota exceeded".into(),
        });
        assert!(err.to_string().contains("403"));
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }
}
