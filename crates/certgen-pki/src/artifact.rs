//! PEM artifact output.
//!
//! Keys are written owner read/write only; certificates with default
//! permissions. Parent directories are created as needed. A failed write is
//! not rolled back.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::keys::PrivateKey;

/// PEM label for certificates.
pub const CERTIFICATE_TAG: &str = "CERTIFICATE";

/// Mode for private key files.
#[cfg(unix)]
const KEY_FILE_MODE: u32 = 0o600;

/// Writes `key` as PEM to `path`, readable by the owner only.
///
/// # Errors
///
/// Returns [`Error::Io`] if the directory or file cannot be written and
/// [`Error::Crypto`] if the key cannot be encoded.
pub fn write_private_key(path: &Path, key: &PrivateKey) -> Result<()> {
    ensure_parent_dir(path)?;
    let pem = key.to_pem()?;

    let mut file = open_private(path)?;
    file.write_all(pem.as_bytes())
        .and_then(|()| file.sync_all())
        .map_err(|e| Error::io(path, e))?;

    debug!("Wrote private key to {}", path.display());
    Ok(())
}

/// Writes DER certificate bytes as PEM to `path`.
///
/// # Errors
///
/// Returns [`Error::Io`] if the directory or file cannot be written.
pub fn write_certificate(path: &Path, der: &[u8]) -> Result<()> {
    ensure_parent_dir(path)?;
    let pem = pem::encode_config(
        &pem::Pem::new(CERTIFICATE_TAG, der),
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    );

    let mut file = File::create(path).map_err(|e| Error::io(path, e))?;
    file.write_all(pem.as_bytes())
        .and_then(|()| file.sync_all())
        .map_err(|e| Error::io(path, e))?;

    debug!("Wrote certificate to {}", path.display());
    Ok(())
}

/// Reads a PEM certificate file, returning its DER bytes.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and [`Error::Parse`]
/// if it does not hold a certificate block.
pub fn read_certificate(path: &Path) -> Result<Vec<u8>> {
    let data = fs::read(path).map_err(|e| Error::io(path, e))?;
    let block = pem::parse(&data)
        .map_err(|e| Error::Parse(format!("invalid PEM in '{}': {e}", path.display())))?;
    if block.tag() != CERTIFICATE_TAG {
        return Err(Error::Parse(format!(
            "expected {CERTIFICATE_TAG} block in '{}', found {}",
            path.display(),
            block.tag()
        )));
    }
    Ok(block.into_contents())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))
        }
        _ => Ok(()),
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(KEY_FILE_MODE)
        .open(path)
        .map_err(|e| Error::io(path, e))?;
    // An existing file keeps its old mode on open.
    file.set_permissions(fs::Permissions::from_mode(KEY_FILE_MODE))
        .map_err(|e| Error::io(path, e))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| Error::io(path, e))
}
