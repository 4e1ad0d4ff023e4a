//! Outcome of a generation run.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, ErrorKind, Result};

/// A certificate written during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedArtifact {
    /// Lineage of common names from the root, `/`-separated.
    pub node: String,
    /// Subject common name.
    pub subject: String,
    /// Issuer common name.
    pub issuer: String,
    /// Serial number, colon-separated hex.
    pub serial: String,
    /// Start of validity.
    pub not_before: DateTime<Utc>,
    /// End of validity.
    pub not_after: DateTime<Utc>,
    /// Whether the certificate is marked as a CA.
    pub is_ca: bool,
    /// Private key file.
    pub key_path: PathBuf,
    /// Certificate file.
    pub cert_path: PathBuf,
}

/// A node whose issuance failed. Its subtree was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuanceFailure {
    /// Lineage of common names from the root, `/`-separated.
    pub node: String,
    /// Error category.
    pub kind: ErrorKind,
    /// Error message.
    pub message: String,
}

impl IssuanceFailure {
    /// Records `error` against `node`.
    #[must_use]
    pub fn new(node: impl Into<String>, error: &Error) -> Self {
        Self {
            node: node.into(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for IssuanceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.node, self.message)
    }
}

/// Everything issued and everything that failed, in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssuanceReport {
    /// Successfully issued certificates.
    pub issued: Vec<IssuedArtifact>,
    /// Failed nodes.
    pub failures: Vec<IssuanceFailure>,
}

impl IssuanceReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_issued(&mut self, artifact: IssuedArtifact) {
        self.issued.push(artifact);
    }

    pub(crate) fn record_failure(&mut self, node: impl Into<String>, error: &Error) {
        self.failures.push(IssuanceFailure::new(node, error));
    }

    /// Returns true if no node failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of nodes attempted: issued plus failed.
    ///
    /// Descendants of a failed node are never attempted.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.issued.len() + self.failures.len()
    }

    /// Finds an issued artifact by lineage.
    #[must_use]
    pub fn find(&self, node: &str) -> Option<&IssuedArtifact> {
        self.issued.iter().find(|a| a.node == node)
    }

    /// Converts the report into an error if anything failed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Batch`] carrying every failure.
    pub fn into_result(self) -> Result<Vec<IssuedArtifact>> {
        if self.failures.is_empty() {
            Ok(self.issued)
        } else {
            Err(Error::Batch {
                attempted: self.issued.len() + self.failures.len(),
                failures: self.failures,
            })
        }
    }
}
