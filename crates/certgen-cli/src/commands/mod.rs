//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`generate`] - Certificate tree issuance
//! - [`verify`] - Re-verification of issued artifacts

pub mod generate;
pub mod verify;

pub use generate::GenerateCommand;
pub use verify::VerifyCommand;
