//! # certgen-cli
//!
//! Command-line front end for `certgen-pki`.
//!
//! Provides commands for:
//! - Generating a certificate tree from a YAML description
//! - Verifying the artifacts of a previous run
//!
//! Logs go to stderr; the run report goes to stdout as a table or JSON.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, Format, GenerateArgs};
pub use error::CliError;
pub use output::OutputFormat;
