//! Certificate generation error types.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::report::IssuanceFailure;

/// Result type for certificate generation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Certificate generation error variants.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration input is missing, unreadable or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Key generation or signing failed.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Directory creation or file access failed.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Certificate parsing failed.
    #[error("certificate parsing failed: {0}")]
    Parse(String),

    /// Certificate validation failed.
    #[error("certificate validation failed: {0}")]
    Validation(String),

    /// Signature verification failed.
    #[error("signature verification failed: {0}")]
    SignatureVerification(String),

    /// One or more nodes of a run failed.
    #[error("{} of {attempted} certificate(s) failed", failures.len())]
    Batch {
        /// Number of nodes attempted.
        attempted: usize,
        /// Every recorded failure.
        failures: Vec<IssuanceFailure>,
    },
}

impl Error {
    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Returns the coarse category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Configuration,
            Self::Crypto(_) => ErrorKind::Crypto,
            Self::Io { .. } => ErrorKind::Io,
            Self::Parse(_) | Self::Validation(_) | Self::SignatureVerification(_) => {
                ErrorKind::Validation
            }
            Self::Batch { .. } => ErrorKind::Batch,
        }
    }
}

/// Coarse error category, carried in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad or missing configuration.
    Configuration,
    /// Key generation or signing failure.
    Crypto,
    /// Filesystem failure.
    Io,
    /// Parsing or verification failure.
    Validation,
    /// Aggregate of several failures.
    Batch,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::Crypto => "crypto",
            Self::Io => "io",
            Self::Validation => "validation",
            Self::Batch => "batch",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_path() {
        let err = Error::io(
            "/tmp/out/root.key",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "I/O error on '/tmp/out/root.key': denied");
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn batch_error_counts_failures() {
        let err = Error::Batch {
            attempted: 3,
            failures: vec![IssuanceFailure::new(
                "Root CA/leaf",
                &Error::Config("bad expires".into()),
            )],
        };
        assert_eq!(err.to_string(), "1 of 3 certificate(s) failed");
    }

    #[test]
    fn error_kinds() {
        assert_eq!(Error::Config(String::new()).kind(), ErrorKind::Configuration);
        assert_eq!(Error::Crypto(String::new()).kind(), ErrorKind::Crypto);
        assert_eq!(
            Error::SignatureVerification(String::new()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(ErrorKind::Configuration.to_string(), "configuration");
    }
}
