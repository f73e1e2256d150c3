//! Password hashing and verification using Argon2

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{Error as HashError, SaltString},
};

/// Hash a plaintext password into a PHC-format string with a random salt
pub fn hash_password(password: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored hash
///
/// A blank password never matches. Returns `Err` only when the stored hash
/// cannot be parsed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, HashError> {
    if password.is_empty() {
        return Ok(false);
    }

    let parsed_hash = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(HashError::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("sample123").unwrap();

        assert_ne!(hash, "sample123");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("sample123", &hash).unwrap());
        assert!(!verify_password("sample124", &hash).unwrap());
    }

    #[test]
    fn test_blank_password_never_matches() {
        let hash = hash_password("").unwrap();
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let first = hash_password("12345").unwrap();
        let second = hash_password("12345").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(verify_password("12345", "plaintext").is_err());
    }
}
