//! Maps a certificate node onto X.509 subject fields and extensions.

use std::net::IpAddr;

use chrono::{DateTime, Duration, Utc};
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose,
    Ia5String, IsCa, KeyUsagePurpose, SanType,
};
use serde::{Deserialize, Serialize};

use crate::config::CertificateNode;
use crate::duration::parse_duration;
use crate::error::{Error, Result};
use crate::serial::SerialNumber;

/// How certificates that sign children are marked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaMarking {
    /// Nodes with children get `CA:TRUE` and `keyCertSign`.
    #[default]
    Conformant,
    /// No node is marked as a CA, even when it signs children.
    Legacy,
}

/// A Subject Alternative Name entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectAltName {
    /// DNS name.
    Dns(String),
    /// IP address.
    Ip(IpAddr),
}

impl SubjectAltName {
    /// Classifies a configured SAN: IP literals become IP entries, anything
    /// else a DNS name.
    #[must_use]
    pub fn classify(value: &str) -> Self {
        value
            .parse::<IpAddr>()
            .map_or_else(|_| Self::Dns(value.to_string()), Self::Ip)
    }
}

impl std::fmt::Display for SubjectAltName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dns(name) => write!(f, "DNS:{name}"),
            Self::Ip(ip) => write!(f, "IP:{ip}"),
        }
    }
}

/// The unsigned certificate for one node.
#[derive(Debug)]
pub struct CertificateTemplate {
    params: CertificateParams,
    serial: SerialNumber,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    is_ca: bool,
}

impl CertificateTemplate {
    /// Builds the template for `node`, valid from `now`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a malformed or non-positive `expires`
    /// or a SAN that is not a valid IA5 string.
    pub fn build(
        node: &CertificateNode,
        now: DateTime<Utc>,
        serial: SerialNumber,
        ca_marking: CaMarking,
    ) -> Result<Self> {
        let (not_before, not_after) = validity_window(&node.expires, now)?;
        let is_ca = ca_marking == CaMarking::Conformant && node.is_issuer();

        let mut params = CertificateParams::default();
        params.serial_number = Some(serial.to_rcgen());
        params.distinguished_name = subject_name(node);
        params.not_before = to_rcgen_time(not_before)?;
        params.not_after = to_rcgen_time(not_after)?;

        params.key_usages = vec![
            KeyUsagePurpose::KeyEncipherment,
            KeyUsagePurpose::DigitalSignature,
        ];
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
        if is_ca {
            params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
            params.key_usages.push(KeyUsagePurpose::KeyCertSign);
        } else {
            params.is_ca = IsCa::ExplicitNoCa;
        }

        params.subject_alt_names = convert_sans(&subject_alt_names(&node.subject_alternative_names))?;

        Ok(Self {
            params,
            serial,
            not_before,
            not_after,
            is_ca,
        })
    }

    /// Returns the signer parameters.
    #[must_use]
    pub const fn params(&self) -> &CertificateParams {
        &self.params
    }

    /// Consumes the template, returning the signer parameters.
    #[must_use]
    pub fn into_params(self) -> CertificateParams {
        self.params
    }

    /// Returns the serial number.
    #[must_use]
    pub const fn serial(&self) -> SerialNumber {
        self.serial
    }

    /// Returns the start of the validity window.
    #[must_use]
    pub const fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    /// Returns the end of the validity window.
    #[must_use]
    pub const fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }

    /// Returns true if the certificate is marked as a CA.
    #[must_use]
    pub const fn is_ca(&self) -> bool {
        self.is_ca
    }
}

/// Builds the subject name. Empty optional fields are left out.
#[must_use]
pub fn subject_name(node: &CertificateNode) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, node.common_name.as_str());

    let optional = [
        (DnType::CountryName, &node.country),
        (DnType::StateOrProvinceName, &node.state),
        (DnType::LocalityName, &node.locality),
        (DnType::OrganizationName, &node.organization),
        (DnType::OrganizationalUnitName, &node.organization_unit),
    ];
    for (ty, value) in optional {
        if !value.is_empty() {
            dn.push(ty, value.as_str());
        }
    }

    dn
}

/// Computes `[now, now + expires]`.
///
/// # Errors
///
/// Returns [`Error::Config`] if `expires` does not parse or is shorter than
/// one second.
pub fn validity_window(expires: &str, now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let lifetime = parse_duration(expires)?;
    if lifetime <= Duration::zero() {
        return Err(Error::Config(format!(
            "expires \"{expires}\" must be a positive duration"
        )));
    }
    // Validity bounds are encoded at one-second precision.
    if lifetime < Duration::seconds(1) {
        return Err(Error::Config(format!(
            "expires \"{expires}\" must be at least one second"
        )));
    }
    let not_after = now
        .checked_add_signed(lifetime)
        .ok_or_else(|| Error::Config(format!("expires \"{expires}\" is out of range")))?;
    Ok((now, not_after))
}

/// Classifies every configured SAN, preserving order.
#[must_use]
pub fn subject_alt_names(values: &[String]) -> Vec<SubjectAltName> {
    values.iter().map(|v| SubjectAltName::classify(v)).collect()
}

/// Converts `SubjectAltNames` to rcgen `SanTypes`.
fn convert_sans(sans: &[SubjectAltName]) -> Result<Vec<SanType>> {
    sans.iter()
        .map(|san| match san {
            SubjectAltName::Dns(dns) => {
                let ia5 = Ia5String::try_from(dns.clone())
                    .map_err(|e| Error::Config(format!("invalid DNS name '{dns}': {e}")))?;
                Ok(SanType::DnsName(ia5))
            }
            SubjectAltName::Ip(ip) => Ok(SanType::IpAddress(*ip)),
        })
        .collect()
}

/// Converts a chrono `DateTime` to rcgen `OffsetDateTime`.
fn to_rcgen_time(dt: DateTime<Utc>) -> Result<time::OffsetDateTime> {
    time::OffsetDateTime::from_unix_timestamp(dt.timestamp())
        .map_err(|e| Error::Config(format!("invalid timestamp: {e}")))
}
