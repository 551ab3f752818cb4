//! Port for posts inside communities.

use async_trait::async_trait;

use crate::domain::{CommunityId, CommunityPost, PostId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by community post adapters.
    pub enum CommunityPostRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "post repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "post repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommunityPostRepository: Send + Sync {
    /// Posts of a community, newest first.
    async fn list(
        &self,
        community_id: &CommunityId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<CommunityPost>, CommunityPostRepositoryError>;

    /// Fetch one post.
    async fn find(&self, id: &PostId) -> Result<Option<CommunityPost>, CommunityPostRepositoryError>;

    /// Store a new post.
    async fn insert(&self, post: &CommunityPost) -> Result<(), CommunityPostRepositoryError>;

    /// Remove a post. Returns `false` when it did not exist.
    async fn delete(&self, id: &PostId) -> Result<bool, CommunityPostRepositoryError>;
}
