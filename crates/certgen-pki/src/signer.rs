//! Certificate signing.

use rcgen::{CertificateParams, KeyPair};
use tracing::debug;

use crate::error::{Error, Result};

/// The certificate and key that sign a child.
///
/// `certificate` is the parent's in-memory template as signed, not a
/// re-parse of the emitted bytes.
#[derive(Clone, Copy)]
pub struct Issuer<'a> {
    certificate: &'a rcgen::Certificate,
    key: &'a KeyPair,
    common_name: &'a str,
}

impl<'a> Issuer<'a> {
    /// Creates an issuer from a signed certificate, its private key and
    /// its subject common name.
    #[must_use]
    pub const fn new(
        certificate: &'a rcgen::Certificate,
        key: &'a KeyPair,
        common_name: &'a str,
    ) -> Self {
        Self {
            certificate,
            key,
            common_name,
        }
    }

    /// Returns the issuer subject common name.
    #[must_use]
    pub const fn common_name(&self) -> &'a str {
        self.common_name
    }
}

impl std::fmt::Debug for Issuer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Issuer")
            .field("common_name", &self.common_name)
            .field("key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Signs `params` for `subject_key`.
///
/// Without an issuer the certificate is self-signed with `subject_key`.
///
/// # Errors
///
/// Returns [`Error::Crypto`] if signing fails.
pub fn sign(
    params: CertificateParams,
    subject_key: &KeyPair,
    issuer: Option<Issuer<'_>>,
) -> Result<rcgen::Certificate> {
    let signed = match issuer {
        Some(issuer) => params.signed_by(subject_key, issuer.certificate, issuer.key),
        None => params.self_signed(subject_key),
    };

    let cert = signed.map_err(|e| Error::Crypto(format!("failed to sign certificate: {e}")))?;
    debug!(
        self_signed = issuer.is_none(),
        "Signed certificate ({} bytes)",
        cert.der().len()
    );
    Ok(cert)
}
