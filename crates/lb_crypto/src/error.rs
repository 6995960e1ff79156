use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("AEAD encryption failed")]
    AeadEncrypt,

    /// Wrong key, tampered or truncated ciphertext. Never retried.
    #[error("Decryption failed (wrong key or corrupted ciphertext)")]
    Decrypt,

    #[error("Key phrase file {0} is accessible by group or others (want mode 0600)")]
    Permission(String),

    #[error("Key phrase is too short: {len} bytes, need at least {min}")]
    TooShort { len: usize, min: usize },

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
