//! Key pair generation.

use rand::rngs::OsRng;
use rcgen::{KeyPair, SignatureAlgorithm};
use rsa::RsaPrivateKey;
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Supported key families and their strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum KeyAlgorithm {
    /// RSA with the given modulus size, signing with SHA-256.
    Rsa {
        /// Modulus size in bits.
        bits: usize,
    },
}

impl KeyAlgorithm {
    /// Default RSA modulus size.
    pub const DEFAULT_RSA_BITS: usize = 4096;
    /// Smallest RSA modulus accepted.
    pub const MIN_RSA_BITS: usize = 2048;
    /// Largest RSA modulus the signer accepts.
    pub const MAX_RSA_BITS: usize = 4096;

    /// RSA with the given modulus size.
    #[must_use]
    pub const fn rsa(bits: usize) -> Self {
        Self::Rsa { bits }
    }

    /// Checks that the strength is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for out-of-range RSA sizes.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Rsa { bits } => {
                if !(Self::MIN_RSA_BITS..=Self::MAX_RSA_BITS).contains(&bits) || bits % 8 != 0 {
                    return Err(Error::Config(format!(
                        "RSA key size must be a multiple of 8 between {} and {} bits, got {bits}",
                        Self::MIN_RSA_BITS,
                        Self::MAX_RSA_BITS
                    )));
                }
                Ok(())
            }
        }
    }

    fn signature_algorithm(&self) -> &'static SignatureAlgorithm {
        match self {
            Self::Rsa { .. } => &rcgen::PKCS_RSA_SHA256,
        }
    }
}

impl Default for KeyAlgorithm {
    fn default() -> Self {
        Self::rsa(Self::DEFAULT_RSA_BITS)
    }
}

impl std::fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rsa { bits } => write!(f, "RSA-{bits}"),
        }
    }
}

/// A private key, tagged by family.
///
/// Each variant owns its on-disk encoding.
pub enum PrivateKey {
    /// RSA private key, written as PKCS#1.
    Rsa(Box<RsaPrivateKey>),
}

impl PrivateKey {
    /// PEM block label for this key family.
    #[must_use]
    pub const fn pem_tag(&self) -> &'static str {
        match self {
            Self::Rsa(_) => "RSA PRIVATE KEY",
        }
    }

    /// Returns the family-specific DER encoding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Crypto`] if encoding fails.
    pub fn to_der(&self) -> Result<Zeroizing<Vec<u8>>> {
        match self {
            Self::Rsa(key) => key
                .to_pkcs1_der()
                .map(|doc| Zeroizing::new(doc.as_bytes().to_vec()))
                .map_err(|e| Error::Crypto(format!("failed to encode RSA key as PKCS#1: {e}"))),
        }
    }

    /// Returns the PEM encoding of this key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Crypto`] if encoding fails.
    pub fn to_pem(&self) -> Result<Zeroizing<String>> {
        let der = self.to_der()?;
        let block = pem::Pem::new(self.pem_tag(), der.as_slice());
        Ok(Zeroizing::new(pem::encode_config(
            &block,
            pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
        )))
    }

    fn to_key_pair(&self, algorithm: &KeyAlgorithm) -> Result<KeyPair> {
        match self {
            Self::Rsa(key) => {
                let pkcs8 = key
                    .to_pkcs8_pem(LineEnding::LF)
                    .map_err(|e| Error::Crypto(format!("failed to encode RSA key as PKCS#8: {e}")))?;
                KeyPair::from_pem_and_sign_algo(&pkcs8, algorithm.signature_algorithm())
                    .map_err(|e| Error::Crypto(format!("failed to load signing key: {e}")))
            }
        }
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rsa(_) => f.write_str("PrivateKey::Rsa([REDACTED])"),
        }
    }
}

/// A freshly generated key: the private key plus its signing handle.
pub struct GeneratedKey {
    algorithm: KeyAlgorithm,
    private_key: PrivateKey,
    key_pair: KeyPair,
}

impl GeneratedKey {
    /// Generates a new key pair from the OS random source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unusable strength and
    /// [`Error::Crypto`] if generation fails.
    pub fn generate(algorithm: &KeyAlgorithm) -> Result<Self> {
        algorithm.validate()?;

        let private_key = match *algorithm {
            KeyAlgorithm::Rsa { bits } => {
                let key = RsaPrivateKey::new(&mut OsRng, bits)
                    .map_err(|e| Error::Crypto(format!("failed to generate RSA key: {e}")))?;
                PrivateKey::Rsa(Box::new(key))
            }
        };
        let key_pair = private_key.to_key_pair(algorithm)?;

        debug!("Generated {} key pair", algorithm);

        Ok(Self {
            algorithm: *algorithm,
            private_key,
            key_pair,
        })
    }

    /// Returns the key family.
    #[must_use]
    pub const fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// Returns the private key.
    #[must_use]
    pub const fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Returns the signing handle used by the signer.
    #[must_use]
    pub const fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }
}

/// Source of fresh key pairs for issuance.
pub trait KeySource {
    /// Generates a key pair for `algorithm`.
    ///
    /// # Errors
    ///
    /// Returns an error if the strength is unusable or generation fails.
    fn generate(&mut self, algorithm: &KeyAlgorithm) -> Result<GeneratedKey>;
}

/// Generates keys from the OS random source.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsKeySource;

impl KeySource for OsKeySource {
    fn generate(&mut self, algorithm: &KeyAlgorithm) -> Result<GeneratedKey> {
        GeneratedKey::generate(algorithm)
    }
}

impl std::fmt::Debug for GeneratedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedKey")
            .field("algorithm", &self.algorithm)
            .field("private_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
