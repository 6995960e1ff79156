//! Field-level record encryption.
//!
//! `id`, `name` and `type` stay in cleartext (they address the record);
//! `opaque` and `meta` are sealed independently, each with its own fresh
//! nonce, and stored as URL-safe base64 of the [`crate::aead`] wire format.
//! Each field is bound to its own associated data, so the two ciphertexts
//! cannot be swapped without failing decryption.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use lb_proto::Record;

use crate::aead;
use crate::error::CryptoError;
use crate::kdf::RecordKey;

const OPAQUE_AAD: &[u8] = b"lb-record-opaque-v1";
const META_AAD: &[u8] = b"lb-record-meta-v1";

/// Encrypt the sensitive fields of a cleartext record.
pub fn encrypt_record(key: &RecordKey, record: &Record) -> Result<Record, CryptoError> {
    Ok(Record {
        id: record.id,
        record_type: record.record_type,
        name: record.name.clone(),
        opaque: encrypt_field(key, &record.opaque, OPAQUE_AAD)?,
        meta: encrypt_field(key, &record.meta, META_AAD)?,
    })
}

/// Decrypt the sensitive fields of an encrypted record.
///
/// Either both fields decrypt or the call fails with
/// [`CryptoError::Decrypt`]; no partially decrypted record is returned.
pub fn decrypt_record(key: &RecordKey, record: &Record) -> Result<Record, CryptoError> {
    let opaque = decrypt_field(key, &record.opaque, OPAQUE_AAD)?;
    let meta = decrypt_field(key, &record.meta, META_AAD)?;
    Ok(Record {
        id: record.id,
        record_type: record.record_type,
        name: record.name.clone(),
        opaque,
        meta,
    })
}

fn encrypt_field(key: &RecordKey, plaintext: &str, aad: &[u8]) -> Result<String, CryptoError> {
    let ct = aead::encrypt(key.as_bytes(), plaintext.as_bytes(), aad)?;
    Ok(URL_SAFE_NO_PAD.encode(ct))
}

fn decrypt_field(key: &RecordKey, encoded: &str, aad: &[u8]) -> Result<String, CryptoError> {
    let ct = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|_| CryptoError::Decrypt)?;
    let pt = aead::decrypt(key.as_bytes(), &ct, aad)?;
    String::from_utf8(pt.to_vec()).map_err(|_| CryptoError::Decrypt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::key_from_phrase;
    use lb_proto::{Note, Payload, RecordType};

    fn note(text: &str, meta: &str) -> Record {
        Record::seal("n1", meta, &Payload::Note(Note { text: text.into() }))
            .unwrap()
            .with_id(42)
    }

    #[test]
    fn roundtrip_keeps_addressing_fields() {
        let key = key_from_phrase(b"qwerty-qwerty");
        let clear = note("hello", "some meta");
        let sealed = encrypt_record(&key, &clear).unwrap();

        assert_eq!(sealed.id, 42);
        assert_eq!(sealed.name, "n1");
        assert_eq!(sealed.record_type, RecordType::Note);
        assert!(!sealed.opaque.contains("hello"));
        assert_ne!(sealed.meta, "some meta");

        assert_eq!(decrypt_record(&key, &sealed).unwrap(), clear);
    }

    #[test]
    fn empty_fields_roundtrip() {
        let key = key_from_phrase(b"qwerty-qwerty");
        let clear = Record {
            opaque: String::new(),
            ..note("", "")
        };
        let sealed = encrypt_record(&key, &clear).unwrap();
        assert!(!sealed.opaque.is_empty());
        assert!(!sealed.meta.is_empty());
        assert_eq!(decrypt_record(&key, &sealed).unwrap(), clear);
    }

    #[test]
    fn encryption_is_randomised() {
        let key = key_from_phrase(b"qwerty-qwerty");
        let clear = note("hello", "m");
        let a = encrypt_record(&key, &clear).unwrap();
        let b = encrypt_record(&key, &clear).unwrap();
        assert_ne!(a.opaque, b.opaque);
        assert_ne!(a.meta, b.meta);
        assert_eq!(decrypt_record(&key, &a).unwrap(), clear);
        assert_eq!(decrypt_record(&key, &b).unwrap(), clear);
    }

    #[test]
    fn wrong_key_fails() {
        let key = key_from_phrase(b"qwerty-qwerty");
        let other = key_from_phrase(b"qwerty-qwertz");
        let sealed = encrypt_record(&key, &note("hello", "")).unwrap();
        assert!(matches!(
            decrypt_record(&other, &sealed),
            Err(CryptoError::Decrypt)
        ));
    }

    #[test]
    fn any_flipped_byte_fails() {
        let key = key_from_phrase(b"qwerty-qwerty");
        let sealed = encrypt_record(&key, &note("hello", "meta")).unwrap();
        let raw = URL_SAFE_NO_PAD.decode(&sealed.opaque).unwrap();
        for i in 0..raw.len() {
            let mut tampered = raw.clone();
            tampered[i] ^= 0x01;
            let rec = Record {
                opaque: URL_SAFE_NO_PAD.encode(&tampered),
                ..sealed.clone()
            };
            assert!(
                matches!(decrypt_record(&key, &rec), Err(CryptoError::Decrypt)),
                "flip at byte {i} went undetected"
            );
        }
    }

    #[test]
    fn swapped_fields_fail() {
        let key = key_from_phrase(b"qwerty-qwerty");
        let sealed = encrypt_record(&key, &note("hello", "meta")).unwrap();
        let swapped = Record {
            opaque: sealed.meta.clone(),
            meta: sealed.opaque.clone(),
            ..sealed
        };
        assert!(decrypt_record(&key, &swapped).is_err());
    }

    #[test]
    fn garbage_and_truncated_fail() {
        let key = key_from_phrase(b"qwerty-qwerty");
        let sealed = encrypt_record(&key, &note("hello", "")).unwrap();
        let truncated = Record {
            opaque: sealed.opaque[..10].to_string(),
            ..sealed.clone()
        };
        assert!(decrypt_record(&key, &truncated).is_err());
        let garbage = Record {
            meta: "not base64 at all!".into(),
            ..sealed
        };
        assert!(decrypt_record(&key, &garbage).is_err());
    }
}
