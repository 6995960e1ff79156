//! lb_crypto — Lockbox cryptographic primitives
//!
//! # Design principles
//! - NO custom crypto; all primitives come from audited Rust crates.
//! - Zeroize key material on drop.
//! - `opaque` and `meta` only ever leave this crate as ciphertext.
//!
//! # Module layout
//! - `aead`     — XChaCha20-Poly1305 encrypt/decrypt helpers
//! - `kdf`      — passphrase file -> 32-byte record key
//! - `password` — Argon2id password hashing for server-side user accounts
//! - `record`   — field-level encryption of a [`lb_proto::Record`]
//! - `error`    — unified error type

pub mod aead;
pub mod error;
pub mod kdf;
pub mod password;
pub mod record;

pub use error::CryptoError;
pub use kdf::{key_from_file, key_from_phrase, RecordKey, MIN_PHRASE_LEN};
pub use record::{decrypt_record, encrypt_record};
