//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use certgen_pki::{IssuanceFailure, IssuanceReport, VerificationReport};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

impl TableDisplay for IssuanceReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.issued.is_empty() && self.failures.is_empty() {
            writeln!(writer, "No certificates configured")?;
            return Ok(());
        }

        if !self.issued.is_empty() {
            writeln!(
                writer,
                "{:<32}  {:<24}  {:<3}  {:<20}  CERTIFICATE",
                "SUBJECT", "ISSUER", "CA", "EXPIRES"
            )?;
            writeln!(writer, "{}", "─".repeat(100))?;
            for artifact in &self.issued {
                writeln!(
                    writer,
                    "{:<32}  {:<24}  {:<3}  {:<20}  {}",
                    truncate(&artifact.subject, 32),
                    truncate(&artifact.issuer, 24),
                    if artifact.is_ca { "yes" } else { "no" },
                    artifact.not_after.format("%Y-%m-%d %H:%M:%S"),
                    artifact.cert_path.display()
                )?;
            }
            writeln!(writer)?;
        }

        write_failures(writer, &self.failures)?;
        writeln!(
            writer,
            "Issued: {} certificate(s), failed: {}",
            self.issued.len(),
            self.failures.len()
        )?;
        Ok(())
    }
}

impl TableDisplay for VerificationReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.verified.is_empty() && self.failures.is_empty() {
            writeln!(writer, "No certificates configured")?;
            return Ok(());
        }

        for verified in &self.verified {
            writeln!(
                writer,
                "ok      {} (issuer: {})",
                verified.node, verified.issuer
            )?;
        }
        for failure in &self.failures {
            writeln!(writer, "FAILED  {failure}")?;
        }
        writeln!(writer)?;
        writeln!(
            writer,
            "Verified: {} certificate(s), failed: {}",
            self.verified.len(),
            self.failures.len()
        )?;
        Ok(())
    }
}

fn write_failures<W: Write>(writer: &mut W, failures: &[IssuanceFailure]) -> Result<(), CliError> {
    if failures.is_empty() {
        return Ok(());
    }
    writeln!(writer, "Failures")?;
    for failure in failures {
        writeln!(writer, "  [{}] {failure}", failure.kind)?;
    }
    writeln!(writer)?;
    Ok(())
}

/// Truncate a string to max length, adding "..." if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{kept}...")
    } else {
        s.chars().take(max_len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certgen_pki::{ErrorKind, IssuedArtifact, VerifiedCertificate};
    use std::path::PathBuf;

    fn report() -> IssuanceReport {
        let now = chrono_now();
        IssuanceReport {
            issued: vec![IssuedArtifact {
                node: "Root CA".into(),
                subject: "Root CA".into(),
                issuer: "Root CA".into(),
                serial: "01:02".into(),
                not_before: now,
                not_after: now,
                is_ca: true,
                key_path: PathBuf::from("out/root.key"),
                cert_path: PathBuf::from("out/root.crt"),
            }],
            failures: vec![IssuanceFailure {
                node: "Root CA/bad".into(),
                kind: ErrorKind::Configuration,
                message: "configuration error: invalid duration \"x\"".into(),
            }],
        }
    }

    fn chrono_now() -> chrono::DateTime<chrono::Utc> {
        "2030-01-02T03:04:05Z".parse().unwrap()
    }

    #[test]
    fn issuance_table_lists_certificates_and_failures() {
        let output = OutputFormat::new(Format::Table).to_string(&report()).unwrap();
        assert!(output.contains("SUBJECT"));
        assert!(output.contains("out/root.crt"));
        assert!(output.contains("2030-01-02 03:04:05"));
        assert!(output.contains("[configuration] Root CA/bad: configuration error"));
        assert!(output.contains("Issued: 1 certificate(s), failed: 1"));
    }

    #[test]
    fn issuance_json_round_trips_fields() {
        let output = OutputFormat::new(Format::Json).to_string(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["issued"][0]["serial"], "01:02");
        assert_eq!(value["issued"][0]["is_ca"], true);
        assert_eq!(value["failures"][0]["kind"], "configuration");
    }

    #[test]
    fn empty_report_table() {
        let output = OutputFormat::default()
            .to_string(&IssuanceReport::default())
            .unwrap();
        assert_eq!(output, "No certificates configured\n");
    }

    #[test]
    fn verification_table() {
        let report = VerificationReport {
            verified: vec![VerifiedCertificate {
                node: "Root CA".into(),
                subject: "Root CA".into(),
                issuer: "Root CA".into(),
                cert_path: PathBuf::from("out/root.crt"),
            }],
            failures: Vec::new(),
        };
        let output = OutputFormat::default().to_string(&report).unwrap();
        assert!(output.contains("ok      Root CA (issuer: Root CA)"));
        assert!(output.contains("Verified: 1 certificate(s), failed: 0"));
    }

    #[test]
    fn truncate_long_string() {
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("hello", 5), "hello");
        assert_eq!(truncate("hello", 3), "hel");
    }
}
