//! Port for communities and their memberships.
//!
//! `member_count` is owned by the adapter: adding or removing a membership
//! adjusts it in the same unit of work, and only when a row actually changed.

use async_trait::async_trait;

use crate::domain::{
    Community, CommunityCategory, CommunityId, CommunityMembership, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by community repository adapters.
    pub enum CommunityRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "community repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "community repository query failed: {message}",
        /// Another community already uses the slug.
        DuplicateSlug { slug: String } => "community slug already in use: {slug}",
    }
}

/// Community listing parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommunityListQuery {
    /// Restrict to one category.
    pub category: Option<CommunityCategory>,
    /// Rows to skip.
    pub offset: usize,
    /// Maximum rows to return.
    pub limit: usize,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommunityRepository: Send + Sync {
    /// List communities ordered by name then id.
    async fn list(
        &self,
        query: &CommunityListQuery,
    ) -> Result<Vec<Community>, CommunityRepositoryError>;

    /// Fetch a community by id.
    async fn find_by_id(
        &self,
        id: &CommunityId,
    ) -> Result<Option<Community>, CommunityRepositoryError>;

    /// Fetch a community by slug.
    async fn find_by_slug(&self, slug: &str)
    -> Result<Option<Community>, CommunityRepositoryError>;

    /// Fetch several communities. Unknown ids are skipped.
    async fn find_many(
        &self,
        ids: &[CommunityId],
    ) -> Result<Vec<Community>, CommunityRepositoryError>;

    /// Store a new community.
    async fn insert(&self, community: &Community) -> Result<(), CommunityRepositoryError>;

    /// Replace name, slug, description, and privacy. Returns `false` when
    /// the community does not exist. The member count is left untouched.
    async fn update(&self, community: &Community) -> Result<bool, CommunityRepositoryError>;

    /// Remove a community with its memberships and posts.
    async fn delete(&self, id: &CommunityId) -> Result<bool, CommunityRepositoryError>;

    /// Fetch one membership.
    async fn find_membership(
        &self,
        community_id: &CommunityId,
        user_id: &UserId,
    ) -> Result<Option<CommunityMembership>, CommunityRepositoryError>;

    /// Add a membership and bump the member count. Returns `false`, changing
    /// nothing, when the user is already a member.
    async fn add_membership(
        &self,
        membership: &CommunityMembership,
    ) -> Result<bool, CommunityRepositoryError>;

    /// Remove a membership and decrement the member count. Returns `false`
    /// when there was nothing to remove.
    async fn remove_membership(
        &self,
        community_id: &CommunityId,
        user_id: &UserId,
    ) -> Result<bool, CommunityRepositoryError>;

    /// All memberships held by a user.
    async fn memberships_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<CommunityMembership>, CommunityRepositoryError>;
}
