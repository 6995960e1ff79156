//! Server-side user password hashing (Argon2id, PHC string format).
//!
//! Only the PHC string is persisted; it carries its own random salt and
//! parameters.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::CryptoError;

pub fn hash_password(password: &str) -> Result<String, CryptoError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CryptoError::PasswordHash(e.to_string()))
}

/// `Ok(false)` on a wrong password; `Err` only if the stored hash is malformed.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, CryptoError> {
    let parsed = PasswordHash::new(stored).map_err(|e| CryptoError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted_and_verifies() {
        let a = hash_password("pass1").unwrap();
        let b = hash_password("pass1").unwrap();
        assert_ne!(a, b);
        assert!(!a.contains("pass1"));
        assert!(verify_password("pass1", &a).unwrap());
        assert!(verify_password("pass1", &b).unwrap());
        assert!(!verify_password("pass2", &a).unwrap());
    }

    #[test]
    fn malformed_hash_is_error() {
        assert!(verify_password("pass1", "not-a-phc-string").is_err());
    }
}
