//! Argon2id hashing for the shared admin password.
//!
//! Hashes are stored in PHC string format so the salt and parameters travel
//! with the hash.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use memora_core::error::CoreError;

/// Minimum length of a new admin password, in characters.
pub const MIN_ADMIN_PASSWORD_LENGTH: usize = 8;

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// `Ok(false)` on a mismatch; `Err` only for an unparseable stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Check a new admin password before it replaces the current one.
pub fn validate_admin_password(password: &str) -> Result<(), CoreError> {
    if password.chars().count() < MIN_ADMIN_PASSWORD_LENGTH {
        return Err(CoreError::Validation(format!(
            "Admin password must be at least {MIN_ADMIN_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("memora2024").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("memora2024", &hash).unwrap());
        assert!(!verify_password("memora2025", &hash).unwrap());
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_admin_password_minimum() {
        assert!(validate_admin_password("short").is_err());
        assert!(validate_admin_password("eightch!").is_ok());
    }
}
