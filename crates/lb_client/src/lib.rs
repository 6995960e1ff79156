//! lb_client — Lockbox client library
//!
//! - `api`    — HTTP client for the record server (ciphertext only)
//! - `sync`   — encrypts, talks to the server and keeps the local cache current
//! - `config` — JSON client configuration
//! - `error`  — [`ClientError`]

pub mod api;
pub mod config;
pub mod error;
pub mod sync;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use sync::SyncClient;
