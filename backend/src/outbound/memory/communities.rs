//! In-memory community, membership, and post repositories.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{
    CommunityListQuery, CommunityPostRepository, CommunityPostRepositoryError,
    CommunityRepository, CommunityRepositoryError,
};
use crate::domain::{Community, CommunityId, CommunityMembership, CommunityPost, PostId, UserId};

use super::{lock, window};

#[derive(Debug, Default)]
struct CommunityState {
    communities: HashMap<CommunityId, Community>,
    memberships: HashMap<(CommunityId, UserId), CommunityMembership>,
}

impl CommunityState {
    fn slug_taken(&self, candidate: &Community) -> bool {
        self.communities
            .values()
            .any(|community| community.id != candidate.id && community.slug == candidate.slug)
    }
}

/// Communities and memberships under one lock so member counts move with
/// the membership rows.
#[derive(Debug, Default)]
pub struct InMemoryCommunityRepository {
    state: Mutex<CommunityState>,
}

impl InMemoryCommunityRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommunityRepository for InMemoryCommunityRepository {
    async fn list(
        &self,
        query: &CommunityListQuery,
    ) -> Result<Vec<Community>, CommunityRepositoryError> {
        let mut communities: Vec<Community> = lock(&self.state)
            .communities
            .values()
            .filter(|community| query.category.is_none_or(|wanted| community.category == wanted))
            .cloned()
            .collect();
        communities.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(window(communities, query.offset, query.limit))
    }

    async fn find_by_id(
        &self,
        id: &CommunityId,
    ) -> Result<Option<Community>, CommunityRepositoryError> {
        Ok(lock(&self.state).communities.get(id).cloned())
    }

    async fn find_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Community>, CommunityRepositoryError> {
        Ok(lock(&self.state)
            .communities
            .values()
            .find(|community| community.slug == slug)
            .cloned())
    }

    async fn find_many(
        &self,
        ids: &[CommunityId],
    ) -> Result<Vec<Community>, CommunityRepositoryError> {
        let state = lock(&self.state);
        Ok(ids
            .iter()
            .filter_map(|id| state.communities.get(id).cloned())
            .collect())
    }

    async fn insert(&self, community: &Community) -> Result<(), CommunityRepositoryError> {
        let mut state = lock(&self.state);
        if state.slug_taken(community) {
            return Err(CommunityRepositoryError::duplicate_slug(community.slug.clone()));
        }
        state.communities.insert(community.id, community.clone());
        Ok(())
    }

    async fn update(&self, community: &Community) -> Result<bool, CommunityRepositoryError> {
        let mut state = lock(&self.state);
        if state.slug_taken(community) {
            return Err(CommunityRepositoryError::duplicate_slug(community.slug.clone()));
        }
        Ok(match state.communities.get_mut(&community.id) {
            Some(stored) => {
                let member_count = stored.member_count;
                *stored = community.clone();
                stored.member_count = member_count;
                true
            }
            None => false,
        })
    }

    async fn delete(&self, id: &CommunityId) -> Result<bool, CommunityRepositoryError> {
        let mut state = lock(&self.state);
        state
            .memberships
            .retain(|(community_id, _), _| community_id != id);
        Ok(state.communities.remove(id).is_some())
    }

    async fn find_membership(
        &self,
        community_id: &CommunityId,
        user_id: &UserId,
    ) -> Result<Option<CommunityMembership>, CommunityRepositoryError> {
        Ok(lock(&self.state)
            .memberships
            .get(&(*community_id, *user_id))
            .cloned())
    }

    async fn add_membership(
        &self,
        membership: &CommunityMembership,
    ) -> Result<bool, CommunityRepositoryError> {
        let mut state = lock(&self.state);
        let key = (membership.community_id, membership.user_id);
        if state.memberships.contains_key(&key) {
            return Ok(false);
        }
        let Some(community) = state.communities.get_mut(&membership.community_id) else {
            return Err(CommunityRepositoryError::query("community does not exist"));
        };
        community.member_count += 1;
        state.memberships.insert(key, membership.clone());
        Ok(true)
    }

    async fn remove_membership(
        &self,
        community_id: &CommunityId,
        user_id: &UserId,
    ) -> Result<bool, CommunityRepositoryError> {
        let mut state = lock(&self.state);
        if state.memberships.remove(&(*community_id, *user_id)).is_none() {
            return Ok(false);
        }
        if let Some(community) = state.communities.get_mut(community_id) {
            community.member_count = (community.member_count - 1).max(0);
        }
        Ok(true)
    }

    async fn memberships_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<CommunityMembership>, CommunityRepositoryError> {
        Ok(lock(&self.state)
            .memberships
            .values()
            .filter(|membership| &membership.user_id == user_id)
            .cloned()
            .collect())
    }
}

/// Community posts keyed by id.
#[derive(Debug, Default)]
pub struct InMemoryCommunityPostRepository {
    posts: Mutex<HashMap<PostId, CommunityPost>>,
}

impl InMemoryCommunityPostRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommunityPostRepository for InMemoryCommunityPostRepository {
    async fn list(
        &self,
        community_id: &CommunityId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<CommunityPost>, CommunityPostRepositoryError> {
        let mut posts: Vec<CommunityPost> = lock(&self.posts)
            .values()
            .filter(|post| &post.community_id == community_id)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(window(posts, offset, limit))
    }

    async fn find(&self, id: &PostId) -> Result<Option<CommunityPost>, CommunityPostRepositoryError> {
        Ok(lock(&self.posts).get(id).cloned())
    }

    async fn insert(&self, post: &CommunityPost) -> Result<(), CommunityPostRepositoryError> {
        lock(&self.posts).insert(post.id, post.clone());
        Ok(())
    }

    async fn delete(&self, id: &PostId) -> Result<bool, CommunityPostRepositoryError> {
        Ok(lock(&self.posts).remove(id).is_some())
    }
}
