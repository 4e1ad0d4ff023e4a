//! Certificate parsing and validation of emitted artifacts.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use x509_parser::prelude::*;

use crate::artifact::read_certificate;
use crate::config::{CertificateNode, Configuration, child_identifier};
use crate::error::{Error, Result};
use crate::options::IssueOptions;
use crate::report::IssuanceFailure;
use crate::serial::format_serial_hex;
use crate::template::SubjectAltName;

/// A parsed DER-encoded X.509 certificate.
#[derive(Debug, Clone)]
pub struct Certificate {
    /// DER-encoded certificate bytes.
    der: Vec<u8>,
    /// Certificate validity start time.
    not_before: DateTime<Utc>,
    /// Certificate validity end time.
    not_after: DateTime<Utc>,
    /// Subject common name.
    subject: String,
    /// Issuer common name.
    issuer: String,
    /// Full subject distinguished name.
    subject_dn: String,
    /// Full issuer distinguished name.
    issuer_dn: String,
    /// Serial number, colon-separated hex.
    serial: String,
    /// Basic constraints CA flag.
    is_ca: bool,
    /// Subject alternative names.
    san: Vec<SubjectAltName>,
}

impl Certificate {
    /// Parses a certificate from DER-encoded bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| Error::Parse(format!("failed to parse certificate: {e}")))?;

        let not_before = DateTime::from_timestamp(cert.validity().not_before.timestamp(), 0)
            .ok_or_else(|| Error::Parse("invalid not_before timestamp".into()))?;
        let not_after = DateTime::from_timestamp(cert.validity().not_after.timestamp(), 0)
            .ok_or_else(|| Error::Parse("invalid not_after timestamp".into()))?;

        let subject = extract_common_name(cert.subject())?;
        let issuer = extract_common_name(cert.issuer())?;
        let is_ca = cert
            .basic_constraints()
            .map_err(|e| Error::Parse(format!("invalid basic constraints: {e}")))?
            .is_some_and(|bc| bc.value.ca);

        Ok(Self {
            der: der.to_vec(),
            not_before,
            not_after,
            subject,
            issuer,
            subject_dn: cert.subject().to_string(),
            issuer_dn: cert.issuer().to_string(),
            serial: format_serial_hex(cert.raw_serial()),
            is_ca,
            san: extract_san(&cert),
        })
    }

    /// Reads and parses a PEM certificate file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_pem_file(path: &Path) -> Result<Self> {
        Self::from_der(&read_certificate(path)?)
    }

    /// Returns the DER-encoded certificate bytes.
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Returns the certificate validity start time.
    #[must_use]
    pub const fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    /// Returns the certificate validity end time.
    #[must_use]
    pub const fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    /// Returns the subject common name.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Returns the issuer common name.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Returns the full subject distinguished name.
    #[must_use]
    pub fn subject_dn(&self) -> &str {
        &self.subject_dn
    }

    /// Returns the full issuer distinguished name.
    #[must_use]
    pub fn issuer_dn(&self) -> &str {
        &self.issuer_dn
    }

    /// Returns the serial number as colon-separated hex.
    #[must_use]
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Returns true if basic constraints mark this certificate as a CA.
    #[must_use]
    pub const fn is_ca(&self) -> bool {
        self.is_ca
    }

    /// Returns the subject alternative names.
    #[must_use]
    pub fn san(&self) -> &[SubjectAltName] {
        &self.san
    }

    /// Verifies that this certificate's signature was made by `issuer`'s key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SignatureVerification`] if the signature does not verify.
    pub fn verify_signed_by(&self, issuer: &Self) -> Result<()> {
        let (_, parsed_cert) = X509Certificate::from_der(&self.der)
            .map_err(|e| Error::Parse(format!("failed to parse certificate: {e}")))?;

        let (_, parsed_issuer) = X509Certificate::from_der(&issuer.der)
            .map_err(|e| Error::Parse(format!("failed to parse issuer certificate: {e}")))?;

        parsed_cert
            .verify_signature(Some(parsed_issuer.public_key()))
            .map_err(|e| {
                Error::SignatureVerification(format!(
                    "'{}' is not signed by '{}': {e:?}",
                    self.subject, issuer.subject
                ))
            })
    }
}

/// Validates a certificate against the certificate that should have issued it.
///
/// Checks the validity window, that the issuer name matches the issuer's
/// subject, and the signature.
///
/// # Errors
///
/// Returns an error if any check fails.
pub fn validate_certificate(cert: &Certificate, issuer: &Certificate) -> Result<()> {
    debug!("Validating certificate: {}", cert.subject());

    if is_expired(cert) {
        return Err(Error::Validation(format!("'{}' has expired", cert.subject())));
    }
    if is_not_yet_valid(cert) {
        return Err(Error::Validation(format!("'{}' is not yet valid", cert.subject())));
    }

    if cert.issuer_dn() != issuer.subject_dn() {
        return Err(Error::Validation(format!(
            "issuer '{}' does not match subject '{}'",
            cert.issuer_dn(),
            issuer.subject_dn()
        )));
    }

    cert.verify_signed_by(issuer)?;

    debug!("Certificate validated successfully: {}", cert.subject());
    Ok(())
}

/// Validates a self-signed certificate.
///
/// # Errors
///
/// Returns an error if the certificate is not self-signed or invalid.
pub fn validate_self_signed(cert: &Certificate) -> Result<()> {
    if cert.issuer_dn() != cert.subject_dn() {
        return Err(Error::Validation(format!(
            "'{}' is not self-signed",
            cert.subject()
        )));
    }
    validate_certificate(cert, cert)
}

/// Checks if a certificate is expired.
#[must_use]
pub fn is_expired(cert: &Certificate) -> bool {
    cert.not_after() < Utc::now()
}

/// Checks if a certificate is not yet valid.
#[must_use]
pub fn is_not_yet_valid(cert: &Certificate) -> bool {
    cert.not_before() > Utc::now()
}

/// A certificate that passed verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedCertificate {
    /// Lineage of common names from the root, `/`-separated.
    pub node: String,
    /// Subject common name.
    pub subject: String,
    /// Issuer common name.
    pub issuer: String,
    /// Certificate file.
    pub cert_path: PathBuf,
}

/// Outcome of verifying the artifacts of a configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    /// Certificates that verified.
    pub verified: Vec<VerifiedCertificate>,
    /// Nodes that failed; their subtrees are not checked.
    pub failures: Vec<IssuanceFailure>,
}

impl VerificationReport {
    /// Returns true if nothing failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Re-reads every certificate the configuration describes and checks it
/// against its parent. Roots must be validly self-signed.
#[must_use]
pub fn verify_tree(config: &Configuration, options: &IssueOptions) -> VerificationReport {
    let mut report = VerificationReport::default();
    for root in &config.certificates {
        verify_node(root, None, None, options, &mut report);
    }
    report
}

fn verify_node(
    node: &CertificateNode,
    parent: Option<&Certificate>,
    parent_id: Option<&str>,
    options: &IssueOptions,
    report: &mut VerificationReport,
) {
    let id = child_identifier(parent_id, node);
    let cert_path = node.cert_path(options.output_root());

    let checked = Certificate::from_pem_file(&cert_path).and_then(|cert| {
        match parent {
            Some(parent) => validate_certificate(&cert, parent)?,
            None => validate_self_signed(&cert)?,
        }
        if cert.subject() != node.common_name {
            return Err(Error::Validation(format!(
                "'{}' holds a certificate for '{}'",
                cert_path.display(),
                cert.subject()
            )));
        }
        Ok(cert)
    });

    let cert = match checked {
        Ok(cert) => cert,
        Err(e) => {
            report.failures.push(IssuanceFailure::new(id, &e));
            return;
        }
    };

    report.verified.push(VerifiedCertificate {
        node: id.clone(),
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        cert_path,
    });

    for child in &node.issue {
        verify_node(child, Some(&cert), Some(&id), options, report);
    }
}

/// Extracts the common name from an X.509 name.
fn extract_common_name(name: &X509Name) -> Result<String> {
    for rdn in name.iter() {
        for attr in rdn.iter() {
            if attr.attr_type() == &x509_parser::oid_registry::OID_X509_COMMON_NAME {
                return attr
                    .as_str()
                    .map(String::from)
                    .map_err(|e| Error::Parse(format!("failed to parse CN: {e}")));
            }
        }
    }
    Err(Error::Parse("common name not found".into()))
}

/// Extracts DNS and IP SANs from a certificate, in encoded order.
fn extract_san(cert: &X509Certificate) -> Vec<SubjectAltName> {
    let mut sans = Vec::new();

    if let Ok(Some(san_ext)) = cert.subject_alternative_name() {
        for name in &san_ext.value.general_names {
            match name {
                GeneralName::DNSName(dns) => {
                    sans.push(SubjectAltName::Dns((*dns).to_string()));
                }
                GeneralName::IPAddress(ip_bytes) => {
                    if let Some(ip) = parse_ip_bytes(ip_bytes) {
                        sans.push(SubjectAltName::Ip(ip));
                    }
                }
                _ => {}
            }
        }
    }

    sans
}

/// Parses IP address bytes into an `IpAddr`.
fn parse_ip_bytes(bytes: &[u8]) -> Option<std::net::IpAddr> {
    match bytes.len() {
        4 => {
            let octets: [u8; 4] = bytes.try_into().ok()?;
            Some(std::net::IpAddr::V4(std::net::Ipv4Addr::from(octets)))
        }
        16 => {
            let octets: [u8; 16] = bytes.try_into().ok()?;
            Some(std::net::IpAddr::V6(std::net::Ipv6Addr::from(octets)))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyAlgorithm;
    use crate::walker::generate;

    fn node(common_name: &str, prefix: &str) -> CertificateNode {
        let mut node = CertificateNode::new(common_name);
        node.expires = "1h".into();
        node.install_to = "pki".into();
        node.filename_prefix = prefix.into();
        node
    }

    fn issue(config: &Configuration) -> (tempfile::TempDir, IssueOptions) {
        let dir = tempfile::tempdir().unwrap();
        let options = IssueOptions::new(dir.path()).with_key_algorithm(KeyAlgorithm::rsa(2048));
        assert!(generate(config, &options).is_success());
        (dir, options)
    }

    #[test]
    fn parses_emitted_certificate() {
        let mut root = node("Root CA", "root");
        root.organization = "Example Corp".into();
        root.subject_alternative_names = vec!["ca.example.com".into(), "::1".into()];
        let config = Configuration {
            certificates: vec![root],
        };
        let (dir, _) = issue(&config);

        let cert = Certificate::from_pem_file(&dir.path().join("pki/root.crt")).unwrap();
        assert_eq!(cert.subject(), "Root CA");
        assert!(cert.subject_dn().contains("CN=Root CA"));
        assert!(cert.subject_dn().contains("O=Example Corp"));
        assert!(!cert.serial().is_empty());
        assert!(!cert.is_ca());
        assert_eq!(cert.san().len(), 2);
        validate_self_signed(&cert).unwrap();
    }

    #[test]
    fn verify_tree_detects_replaced_certificate() {
        let mut root = node("Root CA", "root");
        root.issue.push(node("leaf", "leaf"));
        let other = node("Other Root", "other");
        let config = Configuration {
            certificates: vec![root, other],
        };
        let (dir, options) = issue(&config);

        assert!(verify_tree(&config, &options).is_success());

        // Swap the leaf for a certificate from a different tree.
        std::fs::copy(dir.path().join("pki/other.crt"), dir.path().join("pki/leaf.crt")).unwrap();

        let report = verify_tree(&config, &options);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].node, "Root CA/leaf");
        assert_eq!(report.verified.len(), 2);
    }

    #[test]
    fn verify_tree_reports_missing_files() {
        let config = Configuration {
            certificates: vec![node("Root CA", "root")],
        };
        let dir = tempfile::tempdir().unwrap();
        let options = IssueOptions::new(dir.path());

        let report = verify_tree(&config, &options);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].kind, crate::error::ErrorKind::Io);
    }

    #[test]
    fn garbage_der_is_parse_error() {
        let err = Certificate::from_der(&[0x30, 0x01, 0x00]).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn parse_ip_bytes_lengths() {
        assert_eq!(
            parse_ip_bytes(&[10, 0, 0, 5]),
            Some(std::net::IpAddr::V4(std::net::Ipv4Addr::new(10, 0, 0, 5)))
        );
        assert!(parse_ip_bytes(&[1, 2, 3]).is_none());
    }
}
