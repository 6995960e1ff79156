//! Key derivation
//!
//! `key_from_phrase` — SHA-256 over the raw passphrase bytes.  The key is
//!   never stored anywhere, so the same phrase must always yield the same key:
//!   no salt, no tunable cost.
//!
//! `key_from_file` — reads the phrase from a local file after checking that
//!   the file is private to its owner and the phrase is long enough.

use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::error::CryptoError;

/// Shortest accepted key phrase, in bytes.
pub const MIN_PHRASE_LEN: usize = 10;

/// 32-byte record key.  Lives only in client memory; zeroized on drop.
#[derive(Clone, ZeroizeOnDrop)]
pub struct RecordKey([u8; 32]);

impl RecordKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RecordKey(..)")
    }
}

/// Derive the record key from a passphrase.
pub fn key_from_phrase(phrase: &[u8]) -> RecordKey {
    let digest = Sha256::digest(phrase);
    RecordKey(digest.into())
}

/// Read the key phrase file at `path` and derive the record key from it.
///
/// Fails with [`CryptoError::Permission`] if group/other permission bits are
/// set and [`CryptoError::TooShort`] if the content is under
/// [`MIN_PHRASE_LEN`] bytes.  The content is used verbatim (a trailing
/// newline is part of the phrase).
pub fn key_from_file(path: &Path) -> Result<RecordKey, CryptoError> {
    check_file_mode(path)?;
    let phrase = Zeroizing::new(fs::read(path)?);
    if phrase.len() < MIN_PHRASE_LEN {
        return Err(CryptoError::TooShort {
            len: phrase.len(),
            min: MIN_PHRASE_LEN,
        });
    }
    Ok(key_from_phrase(&phrase))
}

#[cfg(unix)]
fn check_file_mode(path: &Path) -> Result<(), CryptoError> {
    use std::os::unix::fs::PermissionsExt;

    let mode = fs::metadata(path)?.permissions().mode();
    if mode & 0o077 != 0 {
        return Err(CryptoError::Permission(path.display().to_string()));
    }
    Ok(())
}

#[cfg(not(unix))]
fn check_file_mode(path: &Path) -> Result<(), CryptoError> {
    fs::metadata(path)?;
    Ok(())
}
