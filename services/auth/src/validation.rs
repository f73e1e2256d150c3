//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Minimum accepted password length for accounts created over HTTP
pub const MIN_PASSWORD_LENGTH: usize = 5;

/// Canonical form of an email address: trimmed and lower-cased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    Ok(())
}

/// Validate display name
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.chars().count() > 255 {
        return Err("Name must be at most 255 characters long".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        let samples = [
            ("test1@EXAMPLE.COM", "test1@example.com"),
            ("test2@EXAmPLE.COM", "test2@example.com"),
            ("TeSt3@EXAmPLE.COM", "test3@example.com"),
            ("  padded@example.com ", "padded@example.com"),
        ];

        for (email, expected) in samples {
            assert_eq!(normalize_email(email), expected);
        }
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("abc@example.com").is_ok());
        assert_eq!(validate_email(""), Err("Email is required".to_string()));
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("12345").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password("1234").is_err());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("").is_ok());
        assert!(validate_name("Test").is_ok());
        assert!(validate_name(&"n".repeat(256)).is_err());
    }
}
