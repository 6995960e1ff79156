//! lb_store — per-user record storage for Lockbox
//!
//! One SQLite schema (`migrations/`) backs both sides:
//! - the server's authoritative [`Store`], and
//! - the client's [`Cache`], a lazily populated mirror keyed by the
//!   server-assigned record ids.
//!
//! # Encryption
//! The store is crypto-agnostic for records: `opaque` and `meta` arrive
//! already encrypted and are persisted verbatim.  Only user passwords are
//! hashed here (Argon2id, via `lb_crypto::password`).
//!
//! # Concurrency
//! There is no store-wide lock.  Each operation is a single statement (or a
//! single transaction) and uniqueness lives in the schema's `UNIQUE`
//! constraints, so check-then-act sequences are atomic inside SQLite.

pub mod cache;
pub mod db;
pub mod error;
pub mod models;
pub mod records;
pub mod users;

pub use cache::Cache;
pub use db::Store;
pub use error::StoreError;
