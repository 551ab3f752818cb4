//! Community repository decorator caching list queries.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use mockable::Clock;

use crate::domain::ports::{
    CommunityListQuery, CommunityRepository, CommunityRepositoryError,
};
use crate::domain::{Community, CommunityId, CommunityMembership, UserId};

use super::TtlCache;

/// Serves `list` from a [`TtlCache`] and clears it after every write,
/// including membership changes that move member counts.
pub struct CachedCommunityRepository {
    inner: Arc<dyn CommunityRepository>,
    lists: TtlCache<CommunityListQuery, Vec<Community>>,
}

impl CachedCommunityRepository {
    /// Wrap `inner`, caching list results for `ttl`.
    pub fn new(inner: Arc<dyn CommunityRepository>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            lists: TtlCache::new(ttl, clock),
        }
    }

    fn invalidate_after<T>(
        &self,
        result: Result<T, CommunityRepositoryError>,
    ) -> Result<T, CommunityRepositoryError> {
        self.lists.invalidate_all();
        result
    }
}

#[async_trait]
impl CommunityRepository for CachedCommunityRepository {
    async fn list(
        &self,
        query: &CommunityListQuery,
    ) -> Result<Vec<Community>, CommunityRepositoryError> {
        self.lists
            .get_or_insert_with(query.clone(), || self.inner.list(query))
            .await
    }

    async fn find_by_id(
        &self,
        id: &CommunityId,
    ) -> Result<Option<Community>, CommunityRepositoryError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Community>, CommunityRepositoryError> {
        self.inner.find_by_slug(slug).await
    }

    async fn find_many(
        &self,
        ids: &[CommunityId],
    ) -> Result<Vec<Community>, CommunityRepositoryError> {
        self.inner.find_many(ids).await
    }

    async fn insert(&self, community: &Community) -> Result<(), CommunityRepositoryError> {
        let result = self.inner.insert(community).await;
        self.invalidate_after(result)
    }

    async fn update(&self, community: &Community) -> Result<bool, CommunityRepositoryError> {
        let result = self.inner.update(community).await;
        self.invalidate_after(result)
    }

    async fn delete(&self, id: &CommunityId) -> Result<bool, CommunityRepositoryError> {
        let result = self.inner.delete(id).await;
        self.invalidate_after(result)
    }

    async fn find_membership(
        &self,
        community_id: &CommunityId,
        user_id: &UserId,
    ) -> Result<Option<CommunityMembership>, CommunityRepositoryError> {
        self.inner.find_membership(community_id, user_id).await
    }

    async fn add_membership(
        &self,
        membership: &CommunityMembership,
    ) -> Result<bool, CommunityRepositoryError> {
        let result = self.inner.add_membership(membership).await;
        self.invalidate_after(result)
    }

    async fn remove_membership(
        &self,
        community_id: &CommunityId,
        user_id: &UserId,
    ) -> Result<bool, CommunityRepositoryError> {
        let result = self.inner.remove_membership(community_id, user_id).await;
        self.invalidate_after(result)
    }

    async fn memberships_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<CommunityMembership>, CommunityRepositoryError> {
        self.inner.memberships_for_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockCommunityRepository;
    use crate::domain::{CommunityCategory, CommunityPrivacy};
    use crate::test_support::{MutableClock, fixture_now};
    use rstest::rstest;

    fn community() -> Community {
        Community {
            id: CommunityId::random(),
            name: "Promotion 2015".to_owned(),
            slug: "promotion-2015".to_owned(),
            category: CommunityCategory::Promotion,
            description: String::new(),
            privacy: CommunityPrivacy::Public,
            member_count: 1,
            created_at: fixture_now(),
        }
    }

    fn query() -> CommunityListQuery {
        CommunityListQuery {
            category: None,
            offset: 0,
            limit: 21,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn repeated_lists_hit_the_cache_until_a_write() {
        let mut inner = MockCommunityRepository::new();
        inner
            .expect_list()
            .times(2)
            .returning(|_| Ok(vec![community()]));
        inner.expect_add_membership().times(1).returning(|_| Ok(true));
        let clock = Arc::new(MutableClock::at_fixture_now());
        let repo = CachedCommunityRepository::new(Arc::new(inner), Duration::seconds(30), clock);

        repo.list(&query()).await.expect("first list");
        repo.list(&query()).await.expect("cached list");
        repo.add_membership(&CommunityMembership {
            community_id: CommunityId::random(),
            user_id: UserId::random(),
            auto_assigned: false,
            joined_at: fixture_now(),
        })
        .await
        .expect("joined");
        repo.list(&query()).await.expect("reloaded list");
    }

    #[rstest]
    #[tokio::test]
    async fn distinct_queries_are_cached_separately() {
        let mut inner = MockCommunityRepository::new();
        inner.expect_list().times(2).returning(|_| Ok(Vec::new()));
        let clock = Arc::new(MutableClock::at_fixture_now());
        let repo = CachedCommunityRepository::new(Arc::new(inner), Duration::seconds(30), clock);

        repo.list(&query()).await.expect("all");
        let faculties = CommunityListQuery {
            category: Some(CommunityCategory::Faculty),
            ..query()
        };
        repo.list(&faculties).await.expect("faculties");
        repo.list(&faculties).await.expect("faculties cached");
    }

    #[rstest]
    #[tokio::test]
    async fn list_errors_are_not_cached() {
        let mut inner = MockCommunityRepository::new();
        let mut calls = 0;
        inner.expect_list().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(CommunityRepositoryError::connection("down"))
            } else {
                Ok(Vec::new())
            }
        });
        let clock = Arc::new(MutableClock::at_fixture_now());
        let repo = CachedCommunityRepository::new(Arc::new(inner), Duration::seconds(30), clock);

        repo.list(&query()).await.expect_err("outage");
        repo.list(&query()).await.expect("recovered");
    }
}
