//! Error types for the firmscope triage engine.
//!
//! The error surface is deliberately small: a malformed blob or a missing
//! external tool is an absent signal, not an error. Only conditions that
//! abort an entire operation (unreadable input, external tool timeouts)
//! live here.

use thiserror::Error;

/// Main error type for firmscope operations.
#[derive(Debug, Error)]
pub enum FirmscopeError {
    /// File I/O errors; an unreadable top-level input is the only fatal
    /// condition in the analysis pipeline.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// External tool exceeded its wall-clock budget
    #[error("Operation timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

/// Result type alias for firmscope operations
pub type Result<T> = std::result::Result<T, FirmscopeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FirmscopeError::Timeout { seconds: 10 };
        assert_eq!(err.to_string(), "Operation timed out after 10s");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: FirmscopeError = io_err.into();
        assert!(matches!(err, FirmscopeError::Io(_)));
        assert!(err.to_string().contains("missing"));
    }
}
