//! Log-reference sanitization.
//!
//! Clients name log records by reference (`processing_log_20250102_030405`,
//! optionally with a `.json` extension). A reference must reduce to a bare
//! file stem: it can never name a path outside the log directory.

/// Error returned when a reference is not a bare log name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("Log reference is empty")]
    Empty,

    #[error("Path traversal detected in '{reference}'")]
    PathTraversal { reference: String },

    #[error("Log reference '{reference}' contains a forbidden character")]
    ForbiddenCharacter { reference: String },
}

/// Reduce a client-supplied reference to a bare file stem.
///
/// Checks:
/// 1. Not empty (after trimming whitespace and an optional `.json`)
/// 2. No `..` segments
/// 3. No path separators, drive prefixes, NUL, or control characters
///
/// Returns the stem on success. Whether the stem names an existing record is
/// up to the store.
pub fn sanitize_reference(raw: &str) -> Result<&str, ReferenceError> {
    let trimmed = raw.trim();
    let stem = trimmed.strip_suffix(".json").unwrap_or(trimmed);

    if stem.is_empty() {
        return Err(ReferenceError::Empty);
    }

    if stem.contains("..") {
        return Err(ReferenceError::PathTraversal {
            reference: raw.into(),
        });
    }

    if stem
        .chars()
        .any(|c| matches!(c, '/' | '\\' | ':') || c.is_control())
    {
        return Err(ReferenceError::ForbiddenCharacter {
            reference: raw.into(),
        });
    }

    Ok(stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_reference_accepted() {
        assert_eq!(
            sanitize_reference("processing_log_20250102_030405"),
            Ok("processing_log_20250102_030405")
        );
    }

    #[test]
    fn json_extension_stripped() {
        assert_eq!(
            sanitize_reference("encryption_log_20250102_030405_1.json"),
            Ok("encryption_log_20250102_030405_1")
        );
    }

    #[test]
    fn path_traversal_blocked() {
        match sanitize_reference("../../etc/passwd") {
            Err(ReferenceError::PathTraversal { .. }) => {}
            other => panic!("Expected PathTraversal, got: {other:?}"),
        }
        assert!(sanitize_reference("..").is_err());
        assert!(sanitize_reference("..\\..\\boot.ini").is_err());
    }

    #[test]
    fn separators_blocked() {
        for raw in [
            "/etc/passwd",
            "logs/processing_log_20250102_030405",
            "C:\\Windows\\system.ini",
            "C:secret",
        ] {
            match sanitize_reference(raw) {
                Err(ReferenceError::ForbiddenCharacter { .. }) => {}
                other => panic!("Expected ForbiddenCharacter for {raw:?}, got: {other:?}"),
            }
        }
    }

    #[test]
    fn nul_and_control_characters_blocked() {
        assert!(sanitize_reference("processing_log\0.json").is_err());
        assert!(sanitize_reference("processing_log\n").is_ok());
        assert!(sanitize_reference("processing\nlog").is_err());
    }

    #[test]
    fn empty_reference_rejected() {
        assert_eq!(sanitize_reference(""), Err(ReferenceError::Empty));
        assert_eq!(sanitize_reference("   "), Err(ReferenceError::Empty));
        assert_eq!(sanitize_reference(".json"), Err(ReferenceError::Empty));
    }
}
