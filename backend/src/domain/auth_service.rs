//! Account registration, email verification, and credential login.
//!
//! Verification tokens are 32 random bytes, hex encoded. Only their SHA-256
//! digest is stored, so a leaked users table cannot verify accounts.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use chrono::Duration;
use mockable::Clock;
use rand::RngCore;
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::domain::ports::{
    LoginService, PasswordHashError, PasswordHasher, UserPersistenceError, UserRepository,
    VerificationNotifier,
};
use crate::domain::{
    Email, EmailVerification, Error, LoginCredentials, PasswordHash, Registration, Role, User,
    UserId,
};

/// Byte length of a verification token before hex encoding.
pub const VERIFICATION_TOKEN_BYTES: usize = 32;

/// Hashed once and verified against when a login names no account, so both
/// paths pay for one password check.
const UNKNOWN_ACCOUNT_PASSWORD: &str = "unknown-account-placeholder";

/// Tunables for [`AuthService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    /// How long a verification token stays valid.
    pub verification_ttl: Duration,
    /// Accounts registered with these addresses become administrators.
    pub admin_emails: Vec<Email>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            verification_ttl: Duration::hours(24),
            admin_emails: Vec::new(),
        }
    }
}

/// Authentication service implementing [`LoginService`].
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    notifier: Arc<dyn VerificationNotifier>,
    clock: Arc<dyn Clock>,
    settings: AuthSettings,
    unknown_account_hash: Arc<OnceLock<PasswordHash>>,
}

/// Hex-encoded SHA-256 digest of a verification token.
pub fn digest_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn generate_token() -> String {
    let mut bytes = [0_u8; VERIFICATION_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::DuplicateEmail => email_taken(),
    }
}

fn map_hash_error(error: PasswordHashError) -> Error {
    Error::internal(error.to_string())
}

fn email_taken() -> Error {
    Error::conflict("email address already registered")
        .with_details(json!({ "field": "email", "code": "email_taken" }))
}

fn invalid_credentials() -> Error {
    Error::unauthorized("invalid credentials")
}

impl AuthService {
    /// Create the service.
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        notifier: Arc<dyn VerificationNotifier>,
        clock: Arc<dyn Clock>,
        settings: AuthSettings,
    ) -> Self {
        Self {
            users,
            hasher,
            notifier,
            clock,
            settings,
            unknown_account_hash: Arc::new(OnceLock::new()),
        }
    }

    async fn unknown_account_hash(&self) -> Result<PasswordHash, Error> {
        if let Some(hash) = self.unknown_account_hash.get() {
            return Ok(hash.clone());
        }
        let hash = self
            .hasher
            .hash(UNKNOWN_ACCOUNT_PASSWORD)
            .await
            .map_err(map_hash_error)?;
        Ok(self.unknown_account_hash.get_or_init(|| hash).clone())
    }

    /// Register a new, unverified account and send its verification token.
    pub async fn register(&self, registration: Registration) -> Result<User, Error> {
        let email = registration.email().clone();
        if self
            .users
            .find_by_email(&email)
            .await
            .map_err(map_user_error)?
            .is_some()
        {
            return Err(email_taken());
        }

        let password_hash = self
            .hasher
            .hash(registration.password())
            .await
            .map_err(map_hash_error)?;
        let now = self.clock.utc();
        let token = generate_token();
        let expires_at = now + self.settings.verification_ttl;
        let role = if self.settings.admin_emails.contains(&email) {
            Role::Admin
        } else {
            Role::Alumni
        };
        let user = User {
            id: UserId::random(),
            email,
            password_hash,
            role,
            verified: false,
            verification: Some(EmailVerification {
                token: digest_token(&token),
                expires_at,
            }),
            created_at: now,
        };
        self.users.insert(&user).await.map_err(map_user_error)?;

        if let Err(error) = self
            .notifier
            .send_verification(&user.email, &token, expires_at)
            .await
        {
            tracing::warn!(user_id = %user.id, %error, "verification token not delivered");
        }
        Ok(user)
    }

    /// Confirm an email address with the token sent at registration.
    pub async fn verify_email(&self, token: &str) -> Result<User, Error> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::invalid_request("token is required")
                .with_details(json!({ "field": "token", "code": "missing_field" })));
        }
        let mut user = self
            .users
            .find_by_verification_token(&digest_token(token))
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("verification token not found"))?;

        let still_valid = user
            .verification
            .as_ref()
            .is_some_and(|pending| pending.is_valid_at(self.clock.utc()));
        if !still_valid {
            return Err(Error::invalid_request("verification token expired")
                .with_details(json!({ "field": "token", "code": "token_expired" })));
        }

        user.mark_verified();
        if !self.users.update(&user).await.map_err(map_user_error)? {
            return Err(Error::not_found("user not found"));
        }
        Ok(user)
    }

    /// Load the signed-in user. A session pointing at a removed account is
    /// treated as signed out.
    pub async fn current_user(&self, id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::unauthorized("login required"))
    }
}

#[async_trait]
impl LoginService for AuthService {
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<User, Error> {
        let Ok(email) = Email::new(credentials.email()) else {
            return Err(invalid_credentials());
        };
        let Some(user) = self
            .users
            .find_by_email(&email)
            .await
            .map_err(map_user_error)?
        else {
            let hash = self.unknown_account_hash().await?;
            self.hasher
                .verify(credentials.password(), &hash)
                .await
                .map_err(map_hash_error)?;
            return Err(invalid_credentials());
        };
        let matches = self
            .hasher
            .verify(credentials.password(), &user.password_hash)
            .await
            .map_err(map_hash_error)?;
        if matches { Ok(user) } else { Err(invalid_credentials()) }
    }
}

#[cfg(test)]
#[path = "auth_service_tests.rs"]
mod tests;
