//! In-memory `UserRepository`.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{Email, User, UserId};

use super::lock;

/// Users keyed by id. Email uniqueness is checked on insert and update.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(users: &HashMap<UserId, User>, candidate: &User) -> bool {
    users
        .values()
        .any(|user| user.id != candidate.id && user.email == candidate.email)
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut users = lock(&self.users);
        if email_taken(&users, user) || users.contains_key(&user.id) {
            return Err(UserPersistenceError::duplicate_email());
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<bool, UserPersistenceError> {
        let mut users = lock(&self.users);
        if email_taken(&users, user) {
            return Err(UserPersistenceError::duplicate_email());
        }
        Ok(match users.get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                true
            }
            None => false,
        })
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(lock(&self.users).get(id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserPersistenceError> {
        Ok(lock(&self.users)
            .values()
            .find(|user| &user.email == email)
            .cloned())
    }

    async fn find_by_verification_token(
        &self,
        token: &str,
    ) -> Result<Option<User>, UserPersistenceError> {
        Ok(lock(&self.users)
            .values()
            .find(|user| {
                user.verification
                    .as_ref()
                    .is_some_and(|pending| pending.token == token)
            })
            .cloned())
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<User>, UserPersistenceError> {
        let users = lock(&self.users);
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EmailVerification, PasswordHash, Role};
    use crate::test_support::fixture_now;
    use rstest::rstest;

    fn user(email: &str) -> User {
        User {
            id: UserId::random(),
            email: Email::new(email).expect("valid email"),
            password_hash: PasswordHash::new("hash"),
            role: Role::Alumni,
            verified: false,
            verification: Some(EmailVerification {
                token: format!("digest-{email}"),
                expires_at: fixture_now(),
            }),
            created_at: fixture_now(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_emails_are_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.insert(&user("ada@example.org")).await.expect("first insert");
        let error = repo
            .insert(&user("ADA@example.org"))
            .await
            .expect_err("duplicate");
        assert_eq!(error, UserPersistenceError::duplicate_email());
    }

    #[rstest]
    #[tokio::test]
    async fn lookups_by_email_and_token() {
        let repo = InMemoryUserRepository::new();
        let stored = user("grace@example.org");
        repo.insert(&stored).await.expect("insert");

        let by_email = repo
            .find_by_email(&stored.email)
            .await
            .expect("lookup")
            .expect("present");
        assert_eq!(by_email.id, stored.id);

        let by_token = repo
            .find_by_verification_token("digest-grace@example.org")
            .await
            .expect("lookup");
        assert_eq!(by_token.map(|found| found.id), Some(stored.id));

        let missing = repo.find_by_verification_token("other").await.expect("lookup");
        assert!(missing.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn update_reports_missing_users() {
        let repo = InMemoryUserRepository::new();
        assert!(!repo.update(&user("x@example.org")).await.expect("update"));
    }
}
