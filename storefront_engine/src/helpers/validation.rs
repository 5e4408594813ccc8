use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

const USERNAME_PATTERN: &str = r"^[A-Za-z0-9_]{3,32}$";
const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
pub const MIN_PASSWORD_LENGTH: usize = 8;

fn matches(pattern: &str, value: &str) -> Result<bool, ValidationError> {
    let re = Regex::new(pattern).map_err(|e| ValidationError(format!("Invalid pattern {pattern}: {e}")))?;
    Ok(re.is_match(value))
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if matches(USERNAME_PATTERN, username)? {
        Ok(())
    } else {
        Err(ValidationError("Usernames must be 3 to 32 letters, digits or underscores".into()))
    }
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if matches(EMAIL_PATTERN, email)? {
        Ok(())
    } else {
        Err(ValidationError(format!("'{email}' is not a valid email address")))
    }
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() >= MIN_PASSWORD_LENGTH {
        Ok(())
    } else {
        Err(ValidationError(format!("Passwords must be at least {MIN_PASSWORD_LENGTH} characters long")))
    }
}

/// Emails are compared case-insensitively, so they are stored in lowercase.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn usernames() {
        assert!(validate_username("bob_99").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(33)).is_err());
    }

    #[test]
    fn emails() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("nope").is_err());
        assert!(validate_email("a@b").is_err());
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn passwords() {
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("short").is_err());
    }
}
