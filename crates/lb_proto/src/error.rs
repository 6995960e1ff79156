use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("Unknown record type: {0}")]
    UnknownRecordType(String),

    #[error("Invalid {kind} payload: {reason}")]
    InvalidPayload { kind: &'static str, reason: String },

    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),
}

impl ProtoError {
    pub(crate) fn invalid(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            kind,
            reason: reason.into(),
        }
    }
}
