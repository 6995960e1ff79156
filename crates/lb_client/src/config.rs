//! Client configuration file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL, e.g. `http://127.0.0.1:8080`.
    pub server_address: String,
    pub user_name: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
    /// Local mirror; absent or empty disables caching.
    #[serde(default)]
    pub cache_file: Option<PathBuf>,
    /// Key phrase file, must be private to its owner.
    pub key_file: PathBuf,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Accept self-signed server certificates.
    #[serde(default)]
    pub https_insecure: bool,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl ClientConfig {
    pub fn load(path: &Path) -> Result<Self, ClientError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("reading {}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| ClientError::Config(format!("parsing {}: {e}", path.display())))
    }

    pub fn cache_path(&self) -> Option<&Path> {
        self.cache_file
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
