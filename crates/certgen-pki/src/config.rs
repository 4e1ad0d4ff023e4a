//! Declarative certificate tree configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Root certificates, each self-signed.
    pub certificates: Vec<CertificateNode>,
}

impl Configuration {
    /// Loads a configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Reading configuration from {}", path.display());

        let data = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "cannot read configuration file '{}': {e}",
                path.display()
            ))
        })?;

        Self::from_yaml_str(&data).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// Parses a configuration from a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the document is malformed.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| Error::Config(format!("invalid YAML: {e}")))
    }

    /// Returns the number of nodes in the whole forest.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.certificates.iter().map(CertificateNode::subtree_size).sum()
    }
}

/// A certificate to issue, plus the certificates it signs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateNode {
    /// Subject common name.
    pub common_name: String,
    /// Subject country (`C`).
    pub country: String,
    /// Subject state or province (`ST`).
    pub state: String,
    /// Subject locality (`L`).
    pub locality: String,
    /// Subject organization (`O`).
    pub organization: String,
    /// Subject organizational unit (`OU`).
    pub organization_unit: String,
    /// Validity duration from issuance, e.g. `"8760h"`.
    pub expires: String,
    /// DNS names and IP literals, in declared order.
    pub subject_alternative_names: Vec<String>,
    /// Output directory for the key and certificate.
    pub install_to: PathBuf,
    /// File name, without extension, of the key and certificate.
    pub filename_prefix: String,
    /// Certificates signed by this one.
    pub issue: Vec<CertificateNode>,
}

impl CertificateNode {
    /// Creates a node with the given common name and nothing else set.
    #[must_use]
    pub fn new(common_name: impl Into<String>) -> Self {
        Self {
            common_name: common_name.into(),
            ..Self::default()
        }
    }

    /// Checks the fields needed before any artifact can be written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `common_name` or `filename_prefix` is empty.
    pub fn validate(&self) -> Result<()> {
        if self.common_name.trim().is_empty() {
            return Err(Error::Config("common_name cannot be empty".into()));
        }
        if self.filename_prefix.trim().is_empty() {
            return Err(Error::Config(format!(
                "filename_prefix cannot be empty for '{}'",
                self.common_name
            )));
        }
        Ok(())
    }

    /// Returns true if this node signs other certificates.
    #[must_use]
    pub fn is_issuer(&self) -> bool {
        !self.issue.is_empty()
    }

    /// Path of the private key file under `root`.
    #[must_use]
    pub fn key_path(&self, root: &Path) -> PathBuf {
        self.artifact_path(root, "key")
    }

    /// Path of the certificate file under `root`.
    #[must_use]
    pub fn cert_path(&self, root: &Path) -> PathBuf {
        self.artifact_path(root, "crt")
    }

    fn artifact_path(&self, root: &Path, extension: &str) -> PathBuf {
        root.join(&self.install_to)
            .join(format!("{}.{extension}", self.filename_prefix))
    }

    fn subtree_size(&self) -> usize {
        1 + self.issue.iter().map(Self::subtree_size).sum::<usize>()
    }
}

/// Label used for a node in reports and logs.
pub(crate) fn node_label(node: &CertificateNode) -> &str {
    if node.common_name.is_empty() {
        "<unnamed>"
    } else {
        &node.common_name
    }
}

/// Joins a parent identifier and a node label into a lineage path.
pub(crate) fn child_identifier(parent: Option<&str>, node: &CertificateNode) -> String {
    match parent {
        Some(parent) => format!("{parent}/{}", node_label(node)),
        None => node_label(node).to_string(),
    }
}
