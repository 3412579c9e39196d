//! Signup form validation.
//!
//! Every failure carries the exact message shown next to the form field.

use thiserror::Error;

pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 20;
pub const PASSWORD_MIN_LENGTH: usize = 6;

/// Usernames that are always reported as taken.
pub const RESERVED_USERNAMES: [&str; 6] = ["admin", "user", "test", "demo", "stockmaster", "trader123"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Username is required")]
    UsernameEmpty,

    #[error("Username must be 3-20 characters (letters, numbers, underscore only)")]
    UsernameFormat,

    #[error("Username is already taken")]
    UsernameTaken,

    #[error("Please choose a valid and available username")]
    UsernameUnavailable,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,

    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// Result of an availability check, as shown beside the username field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsernameStatus {
    Idle,
    Invalid,
    Taken,
    Available,
}

impl UsernameStatus {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Idle => "",
            Self::Invalid => "Username must be 3-20 characters (letters, numbers, underscore only)",
            Self::Taken => "Username is already taken",
            Self::Available => "Username is available!",
        }
    }
}

/// Check length and character set (`[A-Za-z0-9_]{3,20}`).
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::UsernameEmpty);
    }
    let len = username.chars().count();
    let valid_chars = username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid_chars || !(USERNAME_MIN_LENGTH..=USERNAME_MAX_LENGTH).contains(&len) {
        return Err(ValidationError::UsernameFormat);
    }
    Ok(())
}

/// Format check followed by the reserved-name lookup.
pub fn check_username(username: &str) -> UsernameStatus {
    match validate_username(username) {
        Err(ValidationError::UsernameEmpty) => UsernameStatus::Idle,
        Err(_) => UsernameStatus::Invalid,
        Ok(()) => {
            let lower = username.to_lowercase();
            if RESERVED_USERNAMES.contains(&lower.as_str()) {
                UsernameStatus::Taken
            } else {
                UsernameStatus::Available
            }
        }
    }
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

pub fn validate_password_match(password: &str, confirm: &str) -> Result<(), ValidationError> {
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// Full signup check, in the order the form reports problems.
pub fn validate_signup(username: &str, password: &str, confirm: &str) -> Result<(), ValidationError> {
    if check_username(username) != UsernameStatus::Available {
        return Err(ValidationError::UsernameUnavailable);
    }
    validate_password_match(password, confirm)?;
    validate_password(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_format() {
        assert_eq!(validate_username(""), Err(ValidationError::UsernameEmpty));
        assert_eq!(validate_username("ab"), Err(ValidationError::UsernameFormat));
        assert_eq!(validate_username("bad-name"), Err(ValidationError::UsernameFormat));
        assert_eq!(validate_username(&"x".repeat(21)), Err(ValidationError::UsernameFormat));
        assert!(validate_username("trader_42").is_ok());
        assert!(validate_username(&"x".repeat(20)).is_ok());
    }

    #[test]
    fn test_reserved_names_are_taken() {
        assert_eq!(check_username("Admin"), UsernameStatus::Taken);
        assert_eq!(check_username("trader123"), UsernameStatus::Taken);
        assert_eq!(check_username("newbie"), UsernameStatus::Available);
        assert_eq!(check_username("no"), UsernameStatus::Invalid);
        assert_eq!(check_username(""), UsernameStatus::Idle);
        assert_eq!(UsernameStatus::Taken.message(), "Username is already taken");
    }

    #[test]
    fn test_signup_order() {
        assert_eq!(
            validate_signup("demo", "secret1", "secret1"),
            Err(ValidationError::UsernameUnavailable)
        );
        assert_eq!(
            validate_signup("newbie", "secret1", "secret2"),
            Err(ValidationError::PasswordMismatch)
        );
        assert_eq!(
            validate_signup("newbie", "abc", "abc"),
            Err(ValidationError::PasswordTooShort)
        );
        assert!(validate_signup("newbie", "secret1", "secret1").is_ok());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ValidationError::PasswordTooShort.to_string(),
            "Password must be at least 6 characters"
        );
        assert_eq!(ValidationError::PasswordMismatch.to_string(), "Passwords do not match");
    }
}
