//! The uniform, addressable record.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtoError;
use crate::payload::Payload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Account,
    Note,
    Card,
    Binary,
}

impl RecordType {
    pub const ALL: [RecordType; 4] = [
        RecordType::Account,
        RecordType::Note,
        RecordType::Card,
        RecordType::Binary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::Account => "account",
            RecordType::Note => "note",
            RecordType::Card => "card",
            RecordType::Binary => "binary",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ProtoError::UnknownRecordType(s.to_string()))
    }
}

/// Wire and storage shape: `{id, type, name, opaque, meta}`.
///
/// `id` is assigned by the server (0 until then).  `opaque` and `meta` are
/// ciphertext everywhere except inside a decrypt call; listings leave them
/// empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub name: String,
    #[serde(default)]
    pub opaque: String,
    #[serde(default)]
    pub meta: String,
}

/// Listing result, keyed by record id.
pub type Records = BTreeMap<i64, Record>;

impl Record {
    /// Name/type-only view used by listings.
    pub fn summary(id: i64, record_type: RecordType, name: impl Into<String>) -> Self {
        Self {
            id,
            record_type,
            name: name.into(),
            opaque: String::new(),
            meta: String::new(),
        }
    }

    /// Validate and pack `payload` into a cleartext record ready for encryption.
    pub fn seal(
        name: impl Into<String>,
        meta: impl Into<String>,
        payload: &Payload,
    ) -> Result<Self, ProtoError> {
        payload.validate()?;
        Ok(Self {
            id: 0,
            record_type: payload.record_type(),
            name: name.into(),
            opaque: payload.pack()?,
            meta: meta.into(),
        })
    }

    /// Unpack the (already decrypted) `opaque` field.
    pub fn payload(&self) -> Result<Payload, ProtoError> {
        Payload::unpack(self.record_type, &self.opaque)
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }
}
