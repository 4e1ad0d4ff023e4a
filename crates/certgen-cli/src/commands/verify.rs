//! Verify command implementation.

use std::io::Write;
use std::path::PathBuf;

use certgen_pki::{Configuration, IssueOptions, VerificationReport, verify_tree};

use crate::error::CliError;
use crate::output::OutputFormat;

/// Verify command executor.
pub struct VerifyCommand {
    config_path: PathBuf,
    output_root: PathBuf,
}

impl VerifyCommand {
    /// Create a new verify command.
    #[must_use]
    pub fn new(config_path: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            output_root: output_root.into(),
        }
    }

    /// Execute the verify command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded, output
    /// fails, or any certificate fails verification.
    pub fn execute<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let report = self.run()?;
        format.write(writer, &report)?;

        if report.is_success() {
            Ok(())
        } else {
            Err(CliError::Incomplete {
                failed: report.failures.len(),
                attempted: report.verified.len() + report.failures.len(),
            })
        }
    }

    /// Load the configuration and verify every emitted certificate.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    pub fn run(&self) -> Result<VerificationReport, CliError> {
        let config = Configuration::load(&self.config_path)?;
        Ok(verify_tree(&config, &IssueOptions::new(&self.output_root)))
    }
}
