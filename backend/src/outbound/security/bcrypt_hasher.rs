//! Bcrypt implementation of the `PasswordHasher` port.
//!
//! Hashing is CPU bound, so both operations run on the blocking pool.

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::PasswordHash;
use crate::domain::ports::{PasswordHashError, PasswordHasher};

/// Password hasher using bcrypt at a fixed cost.
#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    /// Hasher using `cost` rounds, clamped to bcrypt's accepted range.
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(4, 31),
        }
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

fn map_join_error(error: tokio::task::JoinError) -> PasswordHashError {
    PasswordHashError::backend(format!("hashing task failed: {error}"))
}

#[async_trait]
impl PasswordHasher for BcryptPasswordHasher {
    async fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHashError> {
        let password = Zeroizing::new(password.to_owned());
        let cost = self.cost;
        let encoded = tokio::task::spawn_blocking(move || bcrypt::hash(password.as_bytes(), cost))
            .await
            .map_err(map_join_error)?
            .map_err(|error| PasswordHashError::backend(error.to_string()))?;
        Ok(PasswordHash::new(encoded))
    }

    async fn verify(
        &self,
        password: &str,
        hash: &PasswordHash,
    ) -> Result<bool, PasswordHashError> {
        let password = Zeroizing::new(password.to_owned());
        let encoded = hash.as_str().to_owned();
        tokio::task::spawn_blocking(move || bcrypt::verify(password.as_bytes(), &encoded))
            .await
            .map_err(map_join_error)?
            .map_err(|error| match error {
                bcrypt::BcryptError::InvalidHash(_)
                | bcrypt::BcryptError::InvalidPrefix(_)
                | bcrypt::BcryptError::InvalidBase64(_)
                | bcrypt::BcryptError::InvalidCost(_) => {
                    PasswordHashError::malformed_hash(error.to_string())
                }
                other => PasswordHashError::backend(other.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn verifies_its_own_hashes() {
        let hasher = BcryptPasswordHasher::new(4);
        let hash = hasher.hash("correct horse").await.expect("hash");

        assert!(hash.as_str().starts_with("$2"));
        assert_eq!(hasher.verify("correct horse", &hash).await, Ok(true));
        assert_eq!(hasher.verify("wrong horse", &hash).await, Ok(false));
    }

    #[rstest]
    #[tokio::test]
    async fn garbage_hashes_are_reported_as_malformed() {
        let hasher = BcryptPasswordHasher::new(4);
        let error = hasher
            .verify("anything", &PasswordHash::new("not-a-hash"))
            .await
            .expect_err("malformed");
        assert!(matches!(error, PasswordHashError::MalformedHash { .. }));
    }

    #[rstest]
    #[case(1, 4)]
    #[case(10, 10)]
    #[case(40, 31)]
    fn cost_is_clamped(#[case] requested: u32, #[case] expected: u32) {
        assert_eq!(BcryptPasswordHasher::new(requested).cost, expected);
    }
}
