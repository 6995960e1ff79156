//! Server configuration file.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

pub const DEFAULT_STORE_FILE: &str = "server_store.db";
pub const DEFAULT_LISTEN_ADDRESS: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub store_file: PathBuf,
    pub listen_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            store_file: PathBuf::from(DEFAULT_STORE_FILE),
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
        }
    }
}

impl ServerConfig {
    /// Read `path`; a missing file means defaults, anything else that
    /// fails to read or parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("parsing config {}", path.display())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("reading config {}", path.display())),
        }
    }
}
