//! PostgreSQL-backed `UserRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{Email, EmailVerification, PasswordHash, Role, User, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error, unique_violation};
use super::models::UserRow;
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed user store. Email uniqueness is enforced by the
/// `users_email_key` constraint.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> UserPersistenceError {
    map_pool_error(error, UserPersistenceError::connection)
}

fn diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    if unique_violation(&error).is_some() {
        return UserPersistenceError::duplicate_email();
    }
    map_diesel_error(
        error,
        UserPersistenceError::query,
        UserPersistenceError::connection,
    )
}

fn to_row(user: &User) -> UserRow {
    UserRow {
        id: *user.id.as_uuid(),
        email: user.email.as_ref().to_owned(),
        password_hash: user.password_hash.as_str().to_owned(),
        role: user.role.as_str().to_owned(),
        verified: user.verified,
        verification_token_digest: user.verification.as_ref().map(|v| v.token.clone()),
        verification_expires_at: user.verification.as_ref().map(|v| v.expires_at),
        created_at: user.created_at,
    }
}

fn from_row(row: UserRow) -> Result<User, UserPersistenceError> {
    let invalid = |what: &str| {
        warn!(user_id = %row.id, column = what, "stored user row is invalid");
        UserPersistenceError::query(format!("stored user has invalid {what}"))
    };
    let email = Email::new(&row.email).map_err(|_| invalid("email"))?;
    let role: Role = row.role.parse().map_err(|_| invalid("role"))?;
    let verification = match (row.verification_token_digest, row.verification_expires_at) {
        (Some(token), Some(expires_at)) => Some(EmailVerification { token, expires_at }),
        _ => None,
    };
    Ok(User {
        id: UserId::from_uuid(row.id),
        email,
        password_hash: PasswordHash::new(row.password_hash),
        role,
        verified: row.verified,
        verification,
        created_at: row.created_at,
    })
}

fn from_rows(rows: Vec<UserRow>) -> Result<Vec<User>, UserPersistenceError> {
    rows.into_iter().map(from_row).collect()
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(users::table)
            .values(&to_row(user))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn update(&self, user: &User) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let affected = diesel::update(users::table.find(user.id.as_uuid()))
            .set(&to_row(user))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(affected > 0)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        users::table
            .find(id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?
            .map(from_row)
            .transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?
            .map(from_row)
            .transpose()
    }

    async fn find_by_verification_token(
        &self,
        token: &str,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        users::table
            .filter(users::verification_token_digest.eq(token))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?
            .map(from_row)
            .transpose()
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let uuids: Vec<uuid::Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = users::table
            .filter(users::id.eq_any(uuids))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        from_rows(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixture_now;
    use rstest::rstest;

    fn user() -> User {
        User {
            id: UserId::random(),
            email: Email::new("ada@example.org").expect("email"),
            password_hash: PasswordHash::new("$2b$04$hash"),
            role: Role::Moderator,
            verified: false,
            verification: Some(EmailVerification {
                token: "digest".to_owned(),
                expires_at: fixture_now(),
            }),
            created_at: fixture_now(),
        }
    }

    #[rstest]
    fn rows_carry_every_user_field() {
        let original = user();
        let restored = from_row(to_row(&original)).expect("valid row");
        assert_eq!(restored, original);
    }

    #[rstest]
    fn unknown_roles_are_rejected() {
        let mut row = to_row(&user());
        row.role = "superuser".to_owned();
        let error = from_row(row).expect_err("invalid role");
        assert!(matches!(error, UserPersistenceError::Query { .. }));
    }

    #[rstest]
    fn half_written_verification_is_dropped() {
        let mut row = to_row(&user());
        row.verification_expires_at = None;
        assert_eq!(from_row(row).expect("valid row").verification, None);
    }
}
