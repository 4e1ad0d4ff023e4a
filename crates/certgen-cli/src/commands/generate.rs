//! Generate command implementation.
//!
//! Loads the configuration, issues every certificate tree and prints the
//! run report.

use std::io::Write;
use std::path::PathBuf;

use certgen_pki::{Configuration, IssuanceReport, IssueOptions, generate};
use tracing::info;

use crate::cli::GenerateArgs;
use crate::error::CliError;
use crate::output::OutputFormat;

/// Generate command executor.
pub struct GenerateCommand {
    config_path: PathBuf,
    output_root: PathBuf,
}

impl GenerateCommand {
    /// Create a new generate command.
    #[must_use]
    pub fn new(config_path: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            output_root: output_root.into(),
        }
    }

    /// Execute the generate command.
    ///
    /// The report is written even when some nodes fail.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded, the key
    /// size is invalid, output fails, or any node failed to issue.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &GenerateArgs,
    ) -> Result<(), CliError> {
        let report = self.run(args)?;
        format.write(writer, &report)?;

        if report.is_success() {
            Ok(())
        } else {
            Err(CliError::Incomplete {
                failed: report.failures.len(),
                attempted: report.attempted(),
            })
        }
    }

    /// Load the configuration and issue every certificate.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or the key
    /// size is invalid. Per-node failures are in the report.
    pub fn run(&self, args: &GenerateArgs) -> Result<IssuanceReport, CliError> {
        let options = self.options(args)?;
        let config = Configuration::load(&self.config_path)?;
        let report = generate(&config, &options);
        info!(
            issued = report.issued.len(),
            failed = report.failures.len(),
            "Generation finished"
        );
        Ok(report)
    }

    fn options(&self, args: &GenerateArgs) -> Result<IssueOptions, CliError> {
        let options = args.issue_options(&self.output_root);
        options
            .key_algorithm
            .validate()
            .map_err(|e| CliError::Config(format!("--key-bits: {e}")))?;
        Ok(options)
    }
}
