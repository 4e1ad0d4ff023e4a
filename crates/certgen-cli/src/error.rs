//! CLI error types.

use std::fmt;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// Invalid configuration or arguments.
    Config(String),
    /// Certificate generation or verification error.
    Pki(certgen_pki::Error),
    /// Output formatting error.
    Format(String),
    /// Some nodes failed; details were already reported.
    Incomplete {
        /// Number of failed nodes.
        failed: usize,
        /// Number of nodes attempted.
        attempted: usize,
    },
    /// IO error.
    Io(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Pki(e) => write!(f, "{e}"),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::Incomplete { failed, attempted } => {
                write!(f, "{failed} of {attempted} certificate(s) failed")
            }
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Pki(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<certgen_pki::Error> for CliError {
    fn from(err: certgen_pki::Error) -> Self {
        Self::Pki(err)
    }
}
