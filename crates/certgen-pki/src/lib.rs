//! Declarative X.509 certificate tree issuance.
//!
//! This crate issues a tree of certificates from a declarative
//! configuration: one or more self-signed roots, each with an arbitrarily
//! deep chain of subordinates signed by their parent. Every certificate is
//! written to disk as a PEM key/certificate pair.
//!
//! # Overview
//!
//! - [`Configuration`] describes the forest of [`CertificateNode`]s.
//! - [`generate`] walks each tree depth-first, parents before children,
//!   and returns an [`IssuanceReport`] listing everything issued and every
//!   failed node. A failure aborts only the failed node's subtree.
//! - [`verify_tree`] re-reads the artifacts and checks every signature.
//!
//! # Example
//!
//! ```no_run
//! use certgen_pki::{generate, Configuration, IssueOptions};
//!
//! let config = Configuration::from_yaml_str(r#"
//! certificates:
//!   - common_name: Root CA
//!     expires: 87600h
//!     install_to: ./out
//!     filename_prefix: root
//!     issue:
//!       - common_name: leaf.example.com
//!         expires: 720h
//!         subject_alternative_names: [leaf.example.com, 10.0.0.5]
//!         install_to: ./out
//!         filename_prefix: leaf
//! "#).unwrap();
//!
//! let report = generate(&config, &IssueOptions::default());
//! assert!(report.is_success());
//! ```
//!
//! # Modules
//!
//! - [`config`] - Configuration data model and YAML loading
//! - [`duration`] - `expires` duration parsing
//! - [`options`] - Run settings
//! - [`keys`] - Key pair generation
//! - [`serial`] - Random serial numbers
//! - [`template`] - Subject and extension mapping
//! - [`signer`] - Certificate signing
//! - [`walker`] - Tree traversal and issuance
//! - [`artifact`] - PEM file output
//! - [`report`] - Run results
//! - [`validation`] - Parsing and verifying emitted certificates
//! - [`error`] - Error types

#![forbid(unsafe_code)]

pub mod artifact;
pub mod config;
pub mod duration;
pub mod error;
pub mod keys;
pub mod options;
pub mod report;
pub mod serial;
pub mod signer;
pub mod template;
pub mod validation;
pub mod walker;

// Re-export commonly used types at crate root
pub use config::{CertificateNode, Configuration};
pub use duration::parse_duration;
pub use error::{Error, ErrorKind, Result};
pub use keys::{GeneratedKey, KeyAlgorithm, KeySource, OsKeySource, PrivateKey};
pub use options::IssueOptions;
pub use report::{IssuanceFailure, IssuanceReport, IssuedArtifact};
pub use serial::SerialNumber;
pub use signer::{Issuer, sign};
pub use template::{CaMarking, CertificateTemplate, SubjectAltName};
pub use validation::{
    Certificate, VerificationReport, VerifiedCertificate, validate_certificate,
    validate_self_signed, verify_tree,
};
pub use walker::{ChainWalker, IssuedCertificate, generate};
