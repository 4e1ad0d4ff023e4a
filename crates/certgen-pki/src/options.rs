//! Settings for a generation run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::keys::KeyAlgorithm;
use crate::template::CaMarking;

/// Settings shared by every node of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueOptions {
    /// Directory that relative `install_to` paths are resolved against.
    pub output_root: PathBuf,
    /// Key family and strength for every generated key.
    pub key_algorithm: KeyAlgorithm,
    /// Whether certificates that sign children are marked as CAs.
    pub ca_marking: CaMarking,
}

impl IssueOptions {
    /// Default options rooted at `output_root`.
    #[must_use]
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            ..Self::default()
        }
    }

    /// Sets the key algorithm.
    #[must_use]
    pub const fn with_key_algorithm(mut self, key_algorithm: KeyAlgorithm) -> Self {
        self.key_algorithm = key_algorithm;
        self
    }

    /// Sets the CA marking policy.
    #[must_use]
    pub const fn with_ca_marking(mut self, ca_marking: CaMarking) -> Self {
        self.ca_marking = ca_marking;
        self
    }

    /// Returns the output root.
    #[must_use]
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }
}

impl Default for IssueOptions {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("."),
            key_algorithm: KeyAlgorithm::default(),
            ca_marking: CaMarking::default(),
        }
    }
}
