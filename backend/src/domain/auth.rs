//! Authentication primitives: login credentials and registration input.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use thiserror::Error;
use zeroize::Zeroizing;

use super::{Email, UserValidationError};

/// Minimum accepted password length, counted in characters.
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Longest accepted password in UTF-8 bytes. bcrypt ignores input beyond it.
pub const PASSWORD_MAX_BYTES: usize = 72;

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginValidationError {
    /// Email was missing or blank once trimmed.
    #[error("email must not be empty")]
    EmptyEmail,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `email` is trimmed, lower-cased, and non-empty. It is not checked for
///   address shape so that lookups of malformed values simply fail to match.
/// - `password` is non-empty and retains caller-provided whitespace.
///
/// # Examples
/// ```
/// use backend::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" Ada@Example.org ", "hunter22").unwrap();
/// assert_eq!(creds.email(), "ada@example.org");
/// assert_eq!(creds.password(), "hunter22");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = email.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyEmail);
        }

        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            email: normalized,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised email used for user lookups.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validation failures for account registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationValidationError {
    /// Email failed validation.
    #[error(transparent)]
    Email(#[from] UserValidationError),
    /// Password shorter than [`PASSWORD_MIN_LENGTH`].
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    /// Password longer than [`PASSWORD_MAX_BYTES`].
    #[error("password must be at most {max} bytes")]
    PasswordTooLong { max: usize },
}

impl RegistrationValidationError {
    /// Name of the offending request field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Email(_) => "email",
            Self::PasswordTooShort { .. } | Self::PasswordTooLong { .. } => "password",
        }
    }
}

/// Validated registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    email: Email,
    password: Zeroizing<String>,
}

impl Registration {
    /// Validate a registration payload.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, RegistrationValidationError> {
        let email = Email::new(email)?;
        if password.chars().count() < PASSWORD_MIN_LENGTH {
            return Err(RegistrationValidationError::PasswordTooShort {
                min: PASSWORD_MIN_LENGTH,
            });
        }
        if password.len() > PASSWORD_MAX_BYTES {
            return Err(RegistrationValidationError::PasswordTooLong {
                max: PASSWORD_MAX_BYTES,
            });
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised email address.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Plaintext password, wiped on drop.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", LoginValidationError::EmptyEmail)]
    #[case("   ", "pw", LoginValidationError::EmptyEmail)]
    #[case("user@example.org", "", LoginValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(email, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case("  ADA@example.org  ", " secret ")]
    #[case("bob@example.org", "correct horse battery staple")]
    fn valid_credentials_normalise_email(#[case] email: &str, #[case] password: &str) {
        let creds = LoginCredentials::try_from_parts(email, password)
            .expect("valid inputs should succeed");
        assert_eq!(creds.email(), email.trim().to_lowercase());
        assert_eq!(creds.password(), password);
    }

    #[rstest]
    #[case("bad-email", "longenough", "email")]
    #[case("ada@example.org", "short", "password")]
    fn registration_reports_offending_field(
        #[case] email: &str,
        #[case] password: &str,
        #[case] field: &str,
    ) {
        let err = Registration::try_from_parts(email, password).expect_err("invalid");
        assert_eq!(err.field(), field);
    }

    #[rstest]
    fn registration_accepts_eight_characters() {
        let registration =
            Registration::try_from_parts("Ada@Example.org", "12345678").expect("valid");
        assert_eq!(registration.email().as_ref(), "ada@example.org");
    }

    #[rstest]
    #[case("x".repeat(72), true)]
    #[case("x".repeat(73), false)]
    #[case("é".repeat(36), true)]
    #[case("é".repeat(37), false)]
    fn registration_bounds_password_bytes(#[case] password: String, #[case] accepted: bool) {
        let result = Registration::try_from_parts("ada@example.org", &password);
        match result {
            Ok(_) => assert!(accepted, "{} bytes should be rejected", password.len()),
            Err(err) => {
                assert!(!accepted, "{} bytes should be accepted", password.len());
                assert_eq!(err, RegistrationValidationError::PasswordTooLong { max: 72 });
            }
        }
    }
}
