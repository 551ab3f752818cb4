//! User accounts: identity, credentials, role, and email verification state.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::UserId;

/// Maximum accepted email length (RFC 5321 path limit).
pub const EMAIL_MAX: usize = 254;

/// Validation errors for user fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserValidationError {
    /// Email was blank.
    #[error("email must not be empty")]
    EmptyEmail,
    /// Email did not look like `local@domain.tld`.
    #[error("email must be a valid address")]
    InvalidEmail,
    /// Email exceeded [`EMAIL_MAX`].
    #[error("email must be at most {max} characters")]
    EmailTooLong { max: usize },
    /// Role string was not recognised.
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Normalised (trimmed, lower-cased) email address.
///
/// # Examples
/// ```
/// use backend::domain::Email;
///
/// let email = Email::new("  Ada@Example.ORG ").expect("valid email");
/// assert_eq!(email.as_ref(), "ada@example.org");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and normalise an email address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        if normalised.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if normalised.chars().count() > EMAIL_MAX {
            return Err(UserValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        if !email_regex().is_match(&normalised) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Account role controlling administrative permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular alumni member.
    #[default]
    Alumni,
    /// Community moderator.
    Moderator,
    /// Portal administrator.
    Admin,
}

impl Role {
    /// Database and wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alumni => "alumni",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }

    /// Whether the role may administer portal-wide resources.
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Whether the role may moderate community content.
    pub fn can_moderate(self) -> bool {
        matches!(self, Self::Admin | Self::Moderator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alumni" => Ok(Self::Alumni),
            "moderator" => Ok(Self::Moderator),
            "admin" => Ok(Self::Admin),
            other => Err(UserValidationError::UnknownRole(other.to_owned())),
        }
    }
}

/// Opaque password hash produced by a [`crate::domain::ports::PasswordHasher`].
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an encoded hash.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Encoded hash string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

/// Pending email verification token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailVerification {
    /// Random token sent to the user.
    pub token: String,
    /// Moment after which the token is rejected.
    pub expires_at: DateTime<Utc>,
}

impl EmailVerification {
    /// Whether the token is still usable at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }
}

/// Registered portal user.
///
/// ## Invariants
/// - `email` is normalised and unique across users.
/// - `verification` is `None` once `verified` is true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Stable identifier.
    pub id: UserId,
    /// Login email.
    pub email: Email,
    /// Hashed password.
    pub password_hash: PasswordHash,
    /// Permission role.
    pub role: Role,
    /// Whether the email address was confirmed.
    pub verified: bool,
    /// Outstanding verification token, if any.
    pub verification: Option<EmailVerification>,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Mark the account verified and drop the pending token.
    pub fn mark_verified(&mut self) {
        self.verified = true;
        self.verification = None;
    }

    /// Identity and role of this user acting on the portal.
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.id,
            role: self.role,
        }
    }
}

/// Signed-in user performing an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Acting user.
    pub id: UserId,
    /// Role at the time of the request.
    pub role: Role,
}

impl Actor {
    /// Whether the actor may edit a record written by `author_id`.
    pub fn can_edit(&self, author_id: UserId) -> bool {
        self.id == author_id || self.role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", UserValidationError::EmptyEmail)]
    #[case("   ", UserValidationError::EmptyEmail)]
    #[case("no-at-sign", UserValidationError::InvalidEmail)]
    #[case("two@@example.org", UserValidationError::InvalidEmail)]
    #[case("missing@tld", UserValidationError::InvalidEmail)]
    fn rejects_invalid_emails(#[case] raw: &str, #[case] expected: UserValidationError) {
        assert_eq!(Email::new(raw).expect_err("invalid email"), expected);
    }

    #[rstest]
    fn rejects_overlong_emails() {
        let raw = format!("{}@example.org", "a".repeat(EMAIL_MAX));
        assert_eq!(
            Email::new(raw).expect_err("too long"),
            UserValidationError::EmailTooLong { max: EMAIL_MAX }
        );
    }

    #[rstest]
    #[case("alumni", Role::Alumni)]
    #[case("moderator", Role::Moderator)]
    #[case("admin", Role::Admin)]
    fn roles_round_trip_through_strings(#[case] raw: &str, #[case] role: Role) {
        assert_eq!(raw.parse::<Role>().expect("known role"), role);
        assert_eq!(role.as_str(), raw);
    }

    #[rstest]
    fn moderation_rights_follow_role() {
        assert!(Role::Admin.can_moderate());
        assert!(Role::Moderator.can_moderate());
        assert!(!Role::Alumni.can_moderate());
        assert!(!Role::Moderator.is_admin());
    }

    #[rstest]
    fn password_hash_debug_is_redacted() {
        let hash = PasswordHash::new("$2b$04$secret");
        assert_eq!(format!("{hash:?}"), "PasswordHash(..)");
    }
}
