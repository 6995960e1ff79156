use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure or timeout.  The only error that sends reads and
    /// listings to the cache.
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Unauthorized: no credentials accepted")]
    Unauthorized,

    #[error("Access denied")]
    Forbidden,

    #[error("Server error {code}: {status}")]
    Server { code: u16, status: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Crypto error: {0}")]
    Crypto(#[from] lb_crypto::CryptoError),

    #[error("Record error: {0}")]
    Proto(#[from] lb_proto::ProtoError),

    #[error("Cache error: {0}")]
    Store(#[from] lb_store::StoreError),

    #[error("Malformed response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            ClientError::NotFound(_) => true,
            ClientError::Store(e) => e.is_not_found(),
            _ => false,
        }
    }
}
