//! Command-line argument parsing with clap.

use std::path::PathBuf;

use certgen_pki::{CaMarking, IssueOptions, KeyAlgorithm};
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Simple PKI certificate generator.
#[derive(Parser, Debug, Clone)]
#[command(name = "cert-gen")]
#[command(
    version,
    about,
    long_about = "A fast and flexible PKI certificate generator for complex PKI architectures."
)]
pub struct Cli {
    /// Certificate configuration file.
    #[arg(
        short,
        long,
        env = "CERTGEN_CONFIG",
        default_value = "certificates.yml",
        global = true
    )]
    pub config: PathBuf,

    /// Directory that relative `install_to` paths are resolved against.
    #[arg(short, long, env = "CERTGEN_OUTPUT_ROOT", default_value = ".", global = true)]
    pub output_root: PathBuf,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table, global = true)]
    pub format: Format,

    /// Subcommand to execute. Defaults to `generate`.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Returns the subcommand, falling back to `generate` with defaults.
    #[must_use]
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Generate(GenerateArgs::default()))
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[derive(Default)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Issue every certificate in the configuration.
    Generate(GenerateArgs),

    /// Check the certificates of a previous run against their issuers.
    Verify,
}

/// Arguments for the generate command.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct GenerateArgs {
    /// RSA key size in bits.
    #[arg(long, default_value_t = KeyAlgorithm::DEFAULT_RSA_BITS)]
    pub key_bits: usize,

    /// Do not mark certificates that sign children as CAs.
    #[arg(long)]
    pub legacy_no_ca: bool,
}

impl GenerateArgs {
    /// Builds run options rooted at `output_root`.
    #[must_use]
    pub fn issue_options(&self, output_root: impl Into<PathBuf>) -> IssueOptions {
        let ca_marking = if self.legacy_no_ca {
            CaMarking::Legacy
        } else {
            CaMarking::Conformant
        };
        IssueOptions::new(output_root)
            .with_key_algorithm(KeyAlgorithm::rsa(self.key_bits))
            .with_ca_marking(ca_marking)
    }
}

impl Default for GenerateArgs {
    fn default() -> Self {
        Self {
            key_bits: KeyAlgorithm::DEFAULT_RSA_BITS,
            legacy_no_ca: false,
        }
    }
}
