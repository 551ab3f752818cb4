//! Community management, membership, posts, and automatic assignment.

use std::collections::HashSet;
use std::sync::Arc;

use mockable::Clock;
use pagination::{Page, PageRequest};
use serde_json::json;

use crate::domain::community::matching::{CommunityTarget, match_communities};
use crate::domain::ports::{
    CommunityListQuery, CommunityPostRepository, CommunityPostRepositoryError,
    CommunityRepository, CommunityRepositoryError,
};
use crate::domain::{
    Actor, AlumniProfile, Community, CommunityCategory, CommunityDraft, CommunityId,
    CommunityMembership, CommunityPost, CommunityPrivacy, Error, MembershipSync, PostId, UserId,
    Viewer, validate_post_content,
};

/// Community use-cases.
#[derive(Clone)]
pub struct CommunityService {
    communities: Arc<dyn CommunityRepository>,
    posts: Arc<dyn CommunityPostRepository>,
    clock: Arc<dyn Clock>,
}

pub(crate) fn map_community_error(error: CommunityRepositoryError) -> Error {
    match error {
        CommunityRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("community repository unavailable: {message}"))
        }
        CommunityRepositoryError::Query { message } => {
            Error::internal(format!("community repository error: {message}"))
        }
        CommunityRepositoryError::DuplicateSlug { slug } => {
            Error::conflict(format!("community slug already in use: {slug}"))
                .with_details(json!({ "field": "slug", "code": "slug_taken" }))
        }
    }
}

fn map_post_error(error: CommunityPostRepositoryError) -> Error {
    match error {
        CommunityPostRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("post repository unavailable: {message}"))
        }
        CommunityPostRepositoryError::Query { message } => {
            Error::internal(format!("post repository error: {message}"))
        }
    }
}

fn community_not_found() -> Error {
    Error::not_found("community not found")
}

fn require_admin(actor: &Actor) -> Result<(), Error> {
    if actor.role.is_admin() {
        Ok(())
    } else {
        Err(Error::forbidden("administrator role required"))
    }
}

impl CommunityService {
    /// Create the service.
    pub fn new(
        communities: Arc<dyn CommunityRepository>,
        posts: Arc<dyn CommunityPostRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            communities,
            posts,
            clock,
        }
    }

    /// List communities, optionally restricted to one category.
    pub async fn list(
        &self,
        category: Option<CommunityCategory>,
        page: &PageRequest,
    ) -> Result<Page<Community>, Error> {
        let query = CommunityListQuery {
            category,
            offset: page.offset(),
            limit: page.fetch_size(),
        };
        let window = self
            .communities
            .list(&query)
            .await
            .map_err(map_community_error)?;
        Ok(Page::from_window(window, page))
    }

    /// Fetch one community.
    pub async fn get(&self, id: &CommunityId) -> Result<Community, Error> {
        self.communities
            .find_by_id(id)
            .await
            .map_err(map_community_error)?
            .ok_or_else(community_not_found)
    }

    /// Create a community. Administrators only.
    pub async fn create(&self, actor: &Actor, draft: CommunityDraft) -> Result<Community, Error> {
        require_admin(actor)?;
        let community = Community {
            id: CommunityId::random(),
            name: draft.name,
            slug: draft.slug,
            category: draft.category,
            description: draft.description,
            privacy: draft.privacy,
            member_count: 0,
            created_at: self.clock.utc(),
        };
        self.communities
            .insert(&community)
            .await
            .map_err(map_community_error)?;
        Ok(community)
    }

    /// Replace a community's editable fields. Administrators only.
    pub async fn update(
        &self,
        actor: &Actor,
        id: &CommunityId,
        draft: CommunityDraft,
    ) -> Result<Community, Error> {
        require_admin(actor)?;
        let mut community = self.get(id).await?;
        community.name = draft.name;
        community.slug = draft.slug;
        community.category = draft.category;
        community.description = draft.description;
        community.privacy = draft.privacy;
        if !self
            .communities
            .update(&community)
            .await
            .map_err(map_community_error)?
        {
            return Err(community_not_found());
        }
        Ok(community)
    }

    /// Delete a community. Administrators only.
    pub async fn delete(&self, actor: &Actor, id: &CommunityId) -> Result<(), Error> {
        require_admin(actor)?;
        if self
            .communities
            .delete(id)
            .await
            .map_err(map_community_error)?
        {
            Ok(())
        } else {
            Err(community_not_found())
        }
    }

    /// Join a community manually. Private communities require moderator
    /// rights.
    pub async fn join(&self, actor: &Actor, id: &CommunityId) -> Result<CommunityMembership, Error> {
        let community = self.get(id).await?;
        if community.privacy == CommunityPrivacy::Private && !actor.role.can_moderate() {
            return Err(Error::forbidden("this community is private"));
        }
        let membership = CommunityMembership {
            community_id: community.id,
            user_id: actor.id,
            auto_assigned: false,
            joined_at: self.clock.utc(),
        };
        if self
            .communities
            .add_membership(&membership)
            .await
            .map_err(map_community_error)?
        {
            Ok(membership)
        } else {
            Err(Error::conflict("already a member of this community"))
        }
    }

    /// Leave a community.
    pub async fn leave(&self, actor: &Actor, id: &CommunityId) -> Result<(), Error> {
        self.get(id).await?;
        if self
            .communities
            .remove_membership(id, &actor.id)
            .await
            .map_err(map_community_error)?
        {
            Ok(())
        } else {
            Err(Error::not_found("not a member of this community"))
        }
    }

    /// Communities the user belongs to, ordered by name.
    pub async fn my_communities(&self, user_id: &UserId) -> Result<Vec<Community>, Error> {
        let ids: Vec<CommunityId> = self
            .communities
            .memberships_for_user(user_id)
            .await
            .map_err(map_community_error)?
            .into_iter()
            .map(|membership| membership.community_id)
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut communities = self
            .communities
            .find_many(&ids)
            .await
            .map_err(map_community_error)?;
        communities.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(communities)
    }

    async fn is_member(&self, community_id: &CommunityId, user_id: &UserId) -> Result<bool, Error> {
        Ok(self
            .communities
            .find_membership(community_id, user_id)
            .await
            .map_err(map_community_error)?
            .is_some())
    }

    /// Posts of a community, newest first. Private communities are readable
    /// by members and moderators only.
    pub async fn list_posts(
        &self,
        viewer: &Viewer,
        id: &CommunityId,
        page: &PageRequest,
    ) -> Result<Page<CommunityPost>, Error> {
        let community = self.get(id).await?;
        if community.privacy == CommunityPrivacy::Private {
            let allowed = match viewer {
                Viewer::Anonymous => false,
                Viewer::User { role, .. } if role.can_moderate() => true,
                Viewer::User { id: user_id, .. } => self.is_member(id, user_id).await?,
            };
            if !allowed {
                return Err(Error::forbidden("only members can read this community"));
            }
        }
        let window = self
            .posts
            .list(id, page.offset(), page.fetch_size())
            .await
            .map_err(map_post_error)?;
        Ok(Page::from_window(window, page))
    }

    /// Publish a post. Members only.
    pub async fn create_post(
        &self,
        actor: &Actor,
        id: &CommunityId,
        content: &str,
    ) -> Result<CommunityPost, Error> {
        let content = validate_post_content(content).map_err(|error| {
            Error::invalid_request(error.to_string())
                .with_details(json!({ "field": error.field(), "code": "invalid_field" }))
        })?;
        self.get(id).await?;
        if !self.is_member(id, &actor.id).await? {
            return Err(Error::forbidden("only members can post in this community"));
        }
        let post = CommunityPost {
            id: PostId::random(),
            community_id: *id,
            author_id: actor.id,
            content,
            created_at: self.clock.utc(),
        };
        self.posts.insert(&post).await.map_err(map_post_error)?;
        Ok(post)
    }

    /// Delete a post. Authors, moderators, and administrators may delete.
    pub async fn delete_post(
        &self,
        actor: &Actor,
        community_id: &CommunityId,
        post_id: &PostId,
    ) -> Result<(), Error> {
        let post = self
            .posts
            .find(post_id)
            .await
            .map_err(map_post_error)?
            .filter(|post| post.community_id == *community_id)
            .ok_or_else(|| Error::not_found("post not found"))?;
        if post.author_id != actor.id && !actor.role.can_moderate() {
            return Err(Error::forbidden("only the author or a moderator can delete this post"));
        }
        self.posts.delete(post_id).await.map_err(map_post_error)?;
        Ok(())
    }

    async fn find_or_create(&self, target: &CommunityTarget) -> Result<Community, Error> {
        if let Some(existing) = self
            .communities
            .find_by_slug(&target.slug)
            .await
            .map_err(map_community_error)?
        {
            return Ok(existing);
        }
        let community = Community {
            id: CommunityId::random(),
            name: target.name.clone(),
            slug: target.slug.clone(),
            category: target.category,
            description: String::new(),
            privacy: CommunityPrivacy::Public,
            member_count: 0,
            created_at: self.clock.utc(),
        };
        match self.communities.insert(&community).await {
            Ok(()) => Ok(community),
            // Lost a creation race; the winner's row is authoritative.
            Err(CommunityRepositoryError::DuplicateSlug { .. }) => self
                .communities
                .find_by_slug(&target.slug)
                .await
                .map_err(map_community_error)?
                .ok_or_else(|| Error::internal("community vanished after slug conflict")),
            Err(error) => Err(map_community_error(error)),
        }
    }

    /// Reconcile a user's automatic memberships with their profile.
    ///
    /// Passing `None` (profile deleted) removes every automatic membership.
    /// Manual memberships are never added or removed here.
    pub async fn sync_memberships(
        &self,
        user_id: &UserId,
        profile: Option<&AlumniProfile>,
    ) -> Result<MembershipSync, Error> {
        let targets = profile.map(match_communities).unwrap_or_default();
        let memberships = self
            .communities
            .memberships_for_user(user_id)
            .await
            .map_err(map_community_error)?;
        let joined: HashSet<CommunityId> = memberships
            .iter()
            .map(|membership| membership.community_id)
            .collect();

        let mut wanted = HashSet::new();
        let mut sync = MembershipSync::default();
        for target in &targets {
            let community = self.find_or_create(target).await?;
            wanted.insert(community.id);
            if joined.contains(&community.id) {
                continue;
            }
            let membership = CommunityMembership {
                community_id: community.id,
                user_id: *user_id,
                auto_assigned: true,
                joined_at: self.clock.utc(),
            };
            if self
                .communities
                .add_membership(&membership)
                .await
                .map_err(map_community_error)?
            {
                sync.added.push(community.id);
            }
        }

        for membership in memberships
            .iter()
            .filter(|membership| membership.auto_assigned)
            .filter(|membership| !wanted.contains(&membership.community_id))
        {
            if self
                .communities
                .remove_membership(&membership.community_id, user_id)
                .await
                .map_err(map_community_error)?
            {
                sync.removed.push(membership.community_id);
            }
        }

        if !sync.is_empty() {
            tracing::debug!(
                user_id = %user_id,
                added = sync.added.len(),
                removed = sync.removed.len(),
                "community memberships synchronised"
            );
        }
        Ok(sync)
    }
}

#[cfg(test)]
#[path = "community_service_tests.rs"]
mod tests;
