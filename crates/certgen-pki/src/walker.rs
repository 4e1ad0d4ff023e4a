//! Depth-first issuance of a certificate tree.
//!
//! Each node is issued before its children, and children are signed by
//! their parent's template and key. A failed node skips its own subtree
//! only: siblings and other roots are still attempted, and every failure
//! is collected in the [`IssuanceReport`].

use chrono::Utc;
use tracing::{info, warn};

use crate::artifact::{write_certificate, write_private_key};
use crate::config::{CertificateNode, Configuration, child_identifier, node_label};
use crate::error::Result;
use crate::keys::{GeneratedKey, KeySource, OsKeySource};
use crate::options::IssueOptions;
use crate::report::{IssuanceReport, IssuedArtifact};
use crate::serial::SerialNumber;
use crate::signer::{Issuer, sign};
use crate::template::CertificateTemplate;

/// A certificate issued during a run, alive while its children are signed.
pub struct IssuedCertificate {
    common_name: String,
    serial: SerialNumber,
    key: GeneratedKey,
    certificate: rcgen::Certificate,
}

impl IssuedCertificate {
    /// Returns this certificate as the issuer for its children.
    #[must_use]
    pub fn as_issuer(&self) -> Issuer<'_> {
        Issuer::new(&self.certificate, self.key.key_pair(), &self.common_name)
    }
}

impl std::fmt::Debug for IssuedCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedCertificate")
            .field("common_name", &self.common_name)
            .field("serial", &self.serial)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// Walks certificate trees, issuing every node.
#[derive(Debug)]
pub struct ChainWalker<'a, K = OsKeySource> {
    options: &'a IssueOptions,
    keys: K,
    report: IssuanceReport,
}

impl<'a> ChainWalker<'a> {
    /// Creates a walker with an empty report, generating keys from the OS
    /// random source.
    #[must_use]
    pub fn new(options: &'a IssueOptions) -> Self {
        Self::with_key_source(options, OsKeySource)
    }
}

impl<'a, K: KeySource> ChainWalker<'a, K> {
    /// Creates a walker with an empty report that draws keys from `keys`.
    #[must_use]
    pub fn with_key_source(options: &'a IssueOptions, keys: K) -> Self {
        Self {
            options,
            keys,
            report: IssuanceReport::new(),
        }
    }

    /// Issues `root` as a self-signed certificate, then its whole subtree.
    pub fn issue_root(&mut self, root: &CertificateNode) {
        self.issue_tree(root, None, None);
    }

    /// Returns the report of everything walked so far.
    #[must_use]
    pub fn finish(self) -> IssuanceReport {
        self.report
    }

    fn issue_tree(&mut self, node: &CertificateNode, issuer: Option<Issuer<'_>>, parent: Option<&str>) {
        let id = child_identifier(parent, node);

        let issued = match self.issue(node, issuer, &id) {
            Ok(issued) => issued,
            Err(e) => {
                warn!(node = %id, "Certificate issuance failed, skipping subtree: {e}");
                self.report.record_failure(id, &e);
                return;
            }
        };

        for child in &node.issue {
            self.issue_tree(child, Some(issued.as_issuer()), Some(&id));
        }
    }

    /// Issues a single node and writes its artifacts.
    ///
    /// Without an issuer the certificate is self-signed.
    ///
    /// # Errors
    ///
    /// Returns the first configuration, crypto or I/O error hit. Artifacts
    /// already written for the node are left in place.
    pub fn issue(
        &mut self,
        node: &CertificateNode,
        issuer: Option<Issuer<'_>>,
        id: &str,
    ) -> Result<IssuedCertificate> {
        info!("Generating certificate for: {}", node_label(node));
        node.validate()?;

        let key = self.keys.generate(&self.options.key_algorithm)?;
        let key_path = node.key_path(self.options.output_root());
        write_private_key(&key_path, key.private_key())?;

        let serial = SerialNumber::random()?;
        let template = CertificateTemplate::build(node, Utc::now(), serial, self.options.ca_marking)?;

        let certificate = sign(template.params().clone(), key.key_pair(), issuer)?;
        let cert_path = node.cert_path(self.options.output_root());
        write_certificate(&cert_path, certificate.der())?;

        let issuer_name = issuer.map_or(node.common_name.as_str(), |i| i.common_name());
        info!(
            serial = %serial,
            ca = template.is_ca(),
            "Issued certificate for {} (issuer: {})",
            node.common_name,
            issuer_name
        );

        self.report.record_issued(IssuedArtifact {
            node: id.to_string(),
            subject: node.common_name.clone(),
            issuer: issuer_name.to_string(),
            serial: serial.to_hex(),
            not_before: template.not_before(),
            not_after: template.not_after(),
            is_ca: template.is_ca(),
            key_path,
            cert_path,
        });

        Ok(IssuedCertificate {
            common_name: node.common_name.clone(),
            serial,
            key,
            certificate,
        })
    }
}

/// Issues every root of `config` and its subtree.
///
/// Roots are independent: a failure in one never stops the others.
#[must_use]
pub fn generate(config: &Configuration, options: &IssueOptions) -> IssuanceReport {
    info!(
        roots = config.certificates.len(),
        nodes = config.node_count(),
        "Generating certificates into {}",
        options.output_root().display()
    );

    let mut walker = ChainWalker::new(options);
    for root in &config.certificates {
        walker.issue_root(root);
    }
    let report = walker.finish();

    if report.is_success() {
        info!("Issued {} certificate(s)", report.issued.len());
    } else {
        warn!(
            "Issued {} certificate(s), {} failed",
            report.issued.len(),
            report.failures.len()
        );
    }
    report
}
