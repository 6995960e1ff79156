//! API request/response types shared between client and server.
//! These map directly to JSON bodies on the wire.

use serde::{Deserialize, Serialize};

/// `status` value of a successful mutation.
pub const STATUS_OK: &str = "OK";

/// Registration body for `POST /users`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    pub password: String,
}

/// Envelope returned by every mutation (and by every error).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub id: i64,
}

impl StatusResponse {
    pub fn ok(name: impl Into<String>, id: i64) -> Self {
        Self {
            name: name.into(),
            status: STATUS_OK.to_string(),
            id,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}
