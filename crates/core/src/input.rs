//! Sanitizers for untrusted form input.
//!
//! Every value typed by a user passes through here before it reaches the
//! session store or the network. Each sanitizer trims surrounding whitespace
//! and enforces a length ceiling; invalid input yields `None`, never an error
//! or panic. Server-side validation still applies, these checks only constrain
//! what the client is willing to send.

use secrecy::SecretString;
use thiserror::Error;

use crate::types::Email;

/// Maximum accepted email length (RFC 5321).
pub const MAX_EMAIL_LENGTH: usize = Email::MAX_LENGTH;

/// Maximum accepted password length.
pub const MAX_PASSWORD_LENGTH: usize = 512;

/// Maximum accepted display-name length.
pub const MAX_NAME_LENGTH: usize = 200;

/// Trim and enforce a character ceiling.
fn sanitize_string(value: &str, max_length: usize) -> Option<&str> {
    let trimmed = value.trim();
    let length = trimmed.chars().count();
    if length == 0 || length > max_length {
        return None;
    }
    Some(trimmed)
}

/// Sanitize an email address.
///
/// Returns `None` if the trimmed input is empty, longer than
/// [`MAX_EMAIL_LENGTH`], or not shaped like `local@domain.tld`.
#[must_use]
pub fn email(value: &str) -> Option<Email> {
    let trimmed = sanitize_string(value, MAX_EMAIL_LENGTH)?;
    Email::parse(trimmed).ok()
}

/// Sanitize a password.
///
/// No complexity policy is applied; that is the server's call. The trimmed
/// value is wrapped in a [`SecretString`] so it cannot leak through `Debug`.
#[must_use]
pub fn password(value: &str) -> Option<SecretString> {
    sanitize_string(value, MAX_PASSWORD_LENGTH).map(|s| SecretString::from(s.to_owned()))
}

/// Sanitize a display name.
#[must_use]
pub fn name(value: &str) -> Option<String> {
    sanitize_string(value, MAX_NAME_LENGTH).map(str::to_owned)
}

/// Form-level validation failures, worded for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Please enter a valid email and password.")]
    InvalidLogin,
    #[error("Please enter a valid name, email and password.")]
    InvalidRegistration,
}

/// Sanitized login credentials.
#[derive(Debug)]
pub struct Credentials {
    pub email: Email,
    pub password: SecretString,
}

impl Credentials {
    /// Validate raw login form fields.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidLogin`] if either field fails sanitization.
    pub fn from_form(email_field: &str, password_field: &str) -> Result<Self, InputError> {
        match (email(email_field), password(password_field)) {
            (Some(email), Some(password)) => Ok(Self { email, password }),
            _ => Err(InputError::InvalidLogin),
        }
    }
}

/// Sanitized registration fields.
#[derive(Debug)]
pub struct Registration {
    pub name: String,
    pub email: Email,
    pub password: SecretString,
}

impl Registration {
    /// Validate raw registration form fields.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidRegistration`] if any field fails
    /// sanitization.
    pub fn from_form(
        name_field: &str,
        email_field: &str,
        password_field: &str,
    ) -> Result<Self, InputError> {
        match (name(name_field), email(email_field), password(password_field)) {
            (Some(name), Some(email), Some(password)) => Ok(Self {
                name,
                email,
                password,
            }),
            _ => Err(InputError::InvalidRegistration),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_email_trims_and_validates() {
        assert_eq!(
            email("  alice@example.com \n").unwrap().as_str(),
            "alice@example.com"
        );
        assert!(email("").is_none());
        assert!(email("   ").is_none());
        assert!(email("alice@example").is_none());
        assert!(email("alice example@x.com").is_none());
    }

    #[test]
    fn test_email_length_ceiling() {
        let at_limit = format!("{}@example.com", "a".repeat(MAX_EMAIL_LENGTH - 12));
        assert_eq!(at_limit.len(), MAX_EMAIL_LENGTH);
        assert!(email(&at_limit).is_some());

        let over = format!("{}@example.com", "a".repeat(MAX_EMAIL_LENGTH - 11));
        assert!(email(&over).is_none());
    }

    #[test]
    fn test_password_accepts_anything_within_bounds() {
        assert_eq!(password(" secret123 ").unwrap().expose_secret(), "secret123");
        assert_eq!(password("a").unwrap().expose_secret(), "a");
        assert!(password("").is_none());
        assert!(password("\t \t").is_none());
        assert!(password(&"p".repeat(MAX_PASSWORD_LENGTH)).is_some());
        assert!(password(&"p".repeat(MAX_PASSWORD_LENGTH + 1)).is_none());
    }

    #[test]
    fn test_name_bounds() {
        assert_eq!(name("  Alice  ").as_deref(), Some("Alice"));
        assert!(name("").is_none());
        assert!(name(&"n".repeat(MAX_NAME_LENGTH)).is_some());
        assert!(name(&"n".repeat(MAX_NAME_LENGTH + 1)).is_none());
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 200 two-byte characters is still within the name limit
        assert!(name(&"é".repeat(MAX_NAME_LENGTH)).is_some());
    }

    #[test]
    fn test_login_form() {
        let creds = Credentials::from_form("alice@example.com", "secret123").unwrap();
        assert_eq!(creds.email.as_str(), "alice@example.com");

        let err = Credentials::from_form("not-an-email", "secret123").unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid email and password.");
        assert!(Credentials::from_form("alice@example.com", "  ").is_err());
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let creds = Credentials::from_form("alice@example.com", "hunter2").unwrap();
        assert!(!format!("{creds:?}").contains("hunter2"));
    }

    #[test]
    fn test_registration_form() {
        let reg = Registration::from_form(" Alice ", "alice@example.com", "secret123").unwrap();
        assert_eq!(reg.name, "Alice");
        assert_eq!(
            Registration::from_form("", "alice@example.com", "secret123").unwrap_err(),
            InputError::InvalidRegistration
        );
    }
}
