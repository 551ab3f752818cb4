//! In-memory `ProfileRepository`.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{ProfileRepository, ProfileRepositoryError, ProfileSearch};
use crate::domain::{AlumniProfile, UserId};

use super::{lock, window};

/// Profiles keyed by owning user.
#[derive(Debug, Default)]
pub struct InMemoryProfileRepository {
    profiles: Mutex<HashMap<UserId, AlumniProfile>>,
}

impl InMemoryProfileRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn insert(&self, profile: &AlumniProfile) -> Result<(), ProfileRepositoryError> {
        let mut profiles = lock(&self.profiles);
        if profiles.contains_key(&profile.user_id) {
            return Err(ProfileRepositoryError::already_exists());
        }
        profiles.insert(profile.user_id, profile.clone());
        Ok(())
    }

    async fn find_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<AlumniProfile>, ProfileRepositoryError> {
        Ok(lock(&self.profiles).get(user_id).cloned())
    }

    async fn update(&self, profile: &AlumniProfile) -> Result<bool, ProfileRepositoryError> {
        Ok(match lock(&self.profiles).get_mut(&profile.user_id) {
            Some(stored) => {
                *stored = profile.clone();
                true
            }
            None => false,
        })
    }

    async fn delete(&self, user_id: &UserId) -> Result<bool, ProfileRepositoryError> {
        Ok(lock(&self.profiles).remove(user_id).is_some())
    }

    async fn search(
        &self,
        search: &ProfileSearch,
    ) -> Result<Vec<AlumniProfile>, ProfileRepositoryError> {
        let mut matching: Vec<AlumniProfile> = lock(&self.profiles)
            .values()
            .filter(|profile| {
                search
                    .visibilities
                    .contains(&profile.privacy.profile_visibility)
                    && search.filter.matches(profile)
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        Ok(window(matching, search.offset, search.limit))
    }
}
