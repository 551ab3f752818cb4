//! Port for alumni profile persistence.
//!
//! Adapters store one profile per user. Inserting a second profile for the
//! same user must fail with [`ProfileRepositoryError::AlreadyExists`] even
//! when two inserts race.

use async_trait::async_trait;

use crate::domain::{AlumniProfile, DirectoryFilter, ProfileVisibility, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by profile repository adapters.
    pub enum ProfileRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "profile repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "profile repository query failed: {message}",
        /// Stored profile document could not be decoded.
        Serialization { message: String } => "profile serialization failed: {message}",
        /// The user already has a profile.
        AlreadyExists => "profile already exists",
    }
}

/// Directory search parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSearch {
    /// Attribute filters.
    pub filter: DirectoryFilter,
    /// Visibilities the viewer may list.
    pub visibilities: Vec<ProfileVisibility>,
    /// Rows to skip.
    pub offset: usize,
    /// Maximum rows to return.
    pub limit: usize,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Store a new profile.
    async fn insert(&self, profile: &AlumniProfile) -> Result<(), ProfileRepositoryError>;

    /// Fetch a user's profile.
    async fn find_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<AlumniProfile>, ProfileRepositoryError>;

    /// Replace a stored profile. Returns `false` when none exists.
    async fn update(&self, profile: &AlumniProfile) -> Result<bool, ProfileRepositoryError>;

    /// Remove a profile. Returns `false` when none existed.
    async fn delete(&self, user_id: &UserId) -> Result<bool, ProfileRepositoryError>;

    /// List profiles ordered by creation time then user id.
    async fn search(
        &self,
        search: &ProfileSearch,
    ) -> Result<Vec<AlumniProfile>, ProfileRepositoryError>;
}
