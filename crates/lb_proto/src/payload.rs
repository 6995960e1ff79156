//! Typed secret payloads.
//!
//! A payload only exists in cleartext inside the client process.  `pack`
//! turns it into the string stored in `Record::opaque` before encryption;
//! `unpack` reverses that after decryption.

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::ProtoError;
use crate::record::RecordType;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub holder: String,
    pub number: String,
    pub exp_month: u8,
    pub exp_year: u16,
    pub cvc: String,
}

/// Raw bytes; packed as standard base64.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Binary {
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Account(Account),
    Note(Note),
    Card(Card),
    Binary(Binary),
}

impl Payload {
    pub fn record_type(&self) -> RecordType {
        match self {
            Payload::Account(_) => RecordType::Account,
            Payload::Note(_) => RecordType::Note,
            Payload::Card(_) => RecordType::Card,
            Payload::Binary(_) => RecordType::Binary,
        }
    }

    pub fn pack(&self) -> Result<String, ProtoError> {
        Ok(match self {
            Payload::Account(a) => serde_json::to_string(a)?,
            Payload::Note(n) => serde_json::to_string(n)?,
            Payload::Card(c) => serde_json::to_string(c)?,
            Payload::Binary(b) => general_purpose::STANDARD.encode(&b.data),
        })
    }

    pub fn unpack(record_type: RecordType, opaque: &str) -> Result<Self, ProtoError> {
        Ok(match record_type {
            RecordType::Account => Payload::Account(serde_json::from_str(opaque)?),
            RecordType::Note => Payload::Note(serde_json::from_str(opaque)?),
            RecordType::Card => Payload::Card(serde_json::from_str(opaque)?),
            RecordType::Binary => Payload::Binary(Binary {
                data: general_purpose::STANDARD.decode(opaque)?,
            }),
        })
    }

    pub fn validate(&self) -> Result<(), ProtoError> {
        match self {
            Payload::Account(a) => a.validate(),
            Payload::Card(c) => c.validate(),
            Payload::Note(_) | Payload::Binary(_) => Ok(()),
        }
    }
}

impl Account {
    pub fn validate(&self) -> Result<(), ProtoError> {
        if self.user_name.is_empty() && self.password.is_empty() {
            return Err(ProtoError::invalid(
                "account",
                "user name and password are both empty",
            ));
        }
        Ok(())
    }
}

impl Card {
    /// Card number with spaces and dashes removed.
    pub fn digits(&self) -> String {
        self.number
            .chars()
            .filter(|c| !matches!(c, ' ' | '-'))
            .collect()
    }

    pub fn validate(&self) -> Result<(), ProtoError> {
        if self.holder.trim().is_empty() {
            return Err(ProtoError::invalid("card", "holder is empty"));
        }
        let digits = self.digits();
        if !(12..=19).contains(&digits.len()) || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ProtoError::invalid("card", "number must be 12-19 digits"));
        }
        if !luhn_valid(&digits) {
            return Err(ProtoError::invalid("card", "number fails checksum"));
        }
        if !(1..=12).contains(&self.exp_month) {
            return Err(ProtoError::invalid("card", "expiry month must be 1-12"));
        }
        if !(1000..=9999).contains(&self.exp_year) {
            return Err(ProtoError::invalid("card", "expiry year must have four digits"));
        }
        if !(3..=4).contains(&self.cvc.len()) || !self.cvc.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ProtoError::invalid("card", "CVC must be 3 or 4 digits"));
        }
        Ok(())
    }
}

// Expects ASCII digits only.
fn luhn_valid(digits: &str) -> bool {
    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}
