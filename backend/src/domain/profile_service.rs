//! Alumni profile use-cases.
//!
//! Every write recomputes completion and then reconciles automatic community
//! memberships through [`CommunityService::sync_memberships`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Datelike;
use mockable::Clock;
use pagination::{Page, PageRequest};
use serde_json::json;

use crate::domain::ports::{
    ProfileRepository, ProfileRepositoryError, ProfileSearch, UserPersistenceError,
    UserRepository,
};
use crate::domain::profile::visibility::access_for;
use crate::domain::{
    AlumniProfile, CommunityService, CompletionStatus, DirectoryFilter, Email, Error,
    ProfileAccess, ProfileInput, ProfileValidationError, ProfileView, PublicProfile, UserId,
    Viewer, VisibilityError,
};

/// Profile use-cases.
#[derive(Clone)]
pub struct ProfileService {
    profiles: Arc<dyn ProfileRepository>,
    users: Arc<dyn UserRepository>,
    communities: CommunityService,
    clock: Arc<dyn Clock>,
}

fn map_profile_error(error: ProfileRepositoryError) -> Error {
    match error {
        ProfileRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("profile repository unavailable: {message}"))
        }
        ProfileRepositoryError::Query { message } => {
            Error::internal(format!("profile repository error: {message}"))
        }
        ProfileRepositoryError::Serialization { message } => {
            Error::internal(format!("profile serialization failed: {message}"))
        }
        ProfileRepositoryError::AlreadyExists => profile_exists(),
    }
}

fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        other => Error::internal(format!("user repository error: {other}")),
    }
}

fn map_validation_error(error: ProfileValidationError) -> Error {
    Error::invalid_request(error.to_string())
        .with_details(json!({ "field": error.field(), "code": error.code() }))
}

fn map_visibility_error(error: VisibilityError) -> Error {
    match error {
        VisibilityError::SignInRequired => Error::unauthorized(error.to_string()),
        VisibilityError::Private => Error::forbidden(error.to_string()),
    }
}

fn profile_exists() -> Error {
    Error::conflict("profile already exists")
}

fn profile_not_found() -> Error {
    Error::not_found("profile not found")
}

impl ProfileService {
    /// Create the service.
    pub fn new(
        profiles: Arc<dyn ProfileRepository>,
        users: Arc<dyn UserRepository>,
        communities: CommunityService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            profiles,
            users,
            communities,
            clock,
        }
    }

    fn current_year(&self) -> i32 {
        self.clock.utc().year()
    }

    /// Create the caller's profile.
    pub async fn create(&self, user_id: &UserId, input: ProfileInput) -> Result<AlumniProfile, Error> {
        if self
            .profiles
            .find_by_user(user_id)
            .await
            .map_err(map_profile_error)?
            .is_some()
        {
            return Err(profile_exists());
        }
        let profile = input
            .validate_new(self.current_year())
            .map_err(map_validation_error)?
            .into_profile(*user_id, self.clock.utc());
        self.profiles
            .insert(&profile)
            .await
            .map_err(map_profile_error)?;
        self.communities
            .sync_memberships(user_id, Some(&profile))
            .await?;
        Ok(profile)
    }

    /// Fetch the caller's profile.
    pub async fn get_own(&self, user_id: &UserId) -> Result<AlumniProfile, Error> {
        self.profiles
            .find_by_user(user_id)
            .await
            .map_err(map_profile_error)?
            .ok_or_else(profile_not_found)
    }

    /// Apply a partial update to the caller's profile.
    pub async fn update(&self, user_id: &UserId, patch: ProfileInput) -> Result<AlumniProfile, Error> {
        let mut profile = self.get_own(user_id).await?;
        patch
            .apply_to(&mut profile, self.current_year())
            .map_err(map_validation_error)?;
        profile.updated_at = self.clock.utc();
        if !self
            .profiles
            .update(&profile)
            .await
            .map_err(map_profile_error)?
        {
            return Err(profile_not_found());
        }
        self.communities
            .sync_memberships(user_id, Some(&profile))
            .await?;
        Ok(profile)
    }

    /// Delete the caller's profile and its automatic memberships.
    pub async fn delete(&self, user_id: &UserId) -> Result<(), Error> {
        if !self
            .profiles
            .delete(user_id)
            .await
            .map_err(map_profile_error)?
        {
            return Err(profile_not_found());
        }
        self.communities.sync_memberships(user_id, None).await?;
        Ok(())
    }

    /// Completion status of the caller's profile.
    pub async fn completion(&self, user_id: &UserId) -> Result<CompletionStatus, Error> {
        Ok(self.get_own(user_id).await?.completion)
    }

    async fn email_for(&self, user_id: &UserId) -> Result<Option<Email>, Error> {
        Ok(self
            .users
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?
            .map(|user| user.email))
    }

    /// Profile of `target` as `viewer` may see it.
    pub async fn public_view(&self, target: &UserId, viewer: &Viewer) -> Result<ProfileView, Error> {
        let profile = self
            .profiles
            .find_by_user(target)
            .await
            .map_err(map_profile_error)?
            .ok_or_else(profile_not_found)?;
        match access_for(&profile, viewer).map_err(map_visibility_error)? {
            ProfileAccess::Full => Ok(ProfileView::Full(Box::new(profile))),
            ProfileAccess::Filtered => {
                let email = if profile.privacy.show_email {
                    self.email_for(&profile.user_id).await?
                } else {
                    None
                };
                Ok(ProfileView::Filtered(PublicProfile::from_profile(
                    &profile,
                    email.as_ref(),
                )))
            }
        }
    }

    /// Directory of profiles visible to `viewer`, as filtered views.
    pub async fn directory(
        &self,
        viewer: &Viewer,
        filter: DirectoryFilter,
        page: &PageRequest,
    ) -> Result<Page<PublicProfile>, Error> {
        let search = ProfileSearch {
            filter,
            visibilities: viewer.listable_visibilities().to_vec(),
            offset: page.offset(),
            limit: page.fetch_size(),
        };
        let window = self
            .profiles
            .search(&search)
            .await
            .map_err(map_profile_error)?;
        let page = Page::from_window(window, page);

        let wanted: Vec<UserId> = page
            .data
            .iter()
            .filter(|profile| profile.privacy.show_email)
            .map(|profile| profile.user_id)
            .collect();
        let emails: HashMap<UserId, Email> = if wanted.is_empty() {
            HashMap::new()
        } else {
            self.users
                .find_many(&wanted)
                .await
                .map_err(map_user_error)?
                .into_iter()
                .map(|user| (user.id, user.email))
                .collect()
        };
        Ok(page.map(|profile| {
            PublicProfile::from_profile(&profile, emails.get(&profile.user_id))
        }))
    }
}

#[cfg(test)]
#[path = "profile_service_tests.rs"]
mod tests;
