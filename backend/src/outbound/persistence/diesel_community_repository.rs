//! PostgreSQL-backed `CommunityRepository`.
//!
//! Membership rows and the denormalised `member_count` change in the same
//! transaction, so the count always equals the number of membership rows.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::{CommunityListQuery, CommunityRepository, CommunityRepositoryError};
use crate::domain::{Community, CommunityId, CommunityMembership, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error, sql_bound, unique_violation};
use super::models::{CommunityRow, CommunityUpdate, MembershipRow};
use super::pool::{DbPool, PoolError};
use super::schema::{communities, community_memberships};

/// Diesel-backed community and membership store.
#[derive(Clone)]
pub struct DieselCommunityRepository {
    pool: DbPool,
}

impl DieselCommunityRepository {
    /// Repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> CommunityRepositoryError {
    map_pool_error(error, CommunityRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> CommunityRepositoryError {
    map_diesel_error(
        error,
        CommunityRepositoryError::query,
        CommunityRepositoryError::connection,
    )
}

fn write_error(error: diesel::result::Error, slug: &str) -> CommunityRepositoryError {
    if unique_violation(&error).is_some() {
        return CommunityRepositoryError::duplicate_slug(slug);
    }
    diesel_error(error)
}

fn to_row(community: &Community) -> CommunityRow {
    CommunityRow {
        id: *community.id.as_uuid(),
        name: community.name.clone(),
        slug: community.slug.clone(),
        category: community.category.as_str().to_owned(),
        description: community.description.clone(),
        privacy: community.privacy.as_str().to_owned(),
        member_count: community.member_count,
        created_at: community.created_at,
    }
}

fn from_row(row: CommunityRow) -> Result<Community, CommunityRepositoryError> {
    let parse_failed = |column: &'static str| {
        warn!(community_id = %row.id, column, "stored community row is invalid");
        CommunityRepositoryError::query(format!("stored community has invalid {column}"))
    };
    let category = row.category.parse().map_err(|_| parse_failed("category"))?;
    let privacy = row.privacy.parse().map_err(|_| parse_failed("privacy"))?;
    Ok(Community {
        id: CommunityId::from_uuid(row.id),
        name: row.name,
        slug: row.slug,
        category,
        description: row.description,
        privacy,
        member_count: row.member_count,
        created_at: row.created_at,
    })
}

fn from_rows(rows: Vec<CommunityRow>) -> Result<Vec<Community>, CommunityRepositoryError> {
    rows.into_iter().map(from_row).collect()
}

fn membership_from_row(row: MembershipRow) -> CommunityMembership {
    CommunityMembership {
        community_id: CommunityId::from_uuid(row.community_id),
        user_id: UserId::from_uuid(row.user_id),
        auto_assigned: row.auto_assigned,
        joined_at: row.joined_at,
    }
}

#[async_trait]
impl CommunityRepository for DieselCommunityRepository {
    async fn list(
        &self,
        query: &CommunityListQuery,
    ) -> Result<Vec<Community>, CommunityRepositoryError> {
        let mut statement = communities::table
            .select(CommunityRow::as_select())
            .into_boxed();
        if let Some(category) = query.category {
            statement = statement.filter(communities::category.eq(category.as_str()));
        }
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = statement
            .order((communities::name.asc(), communities::id.asc()))
            .offset(sql_bound(query.offset))
            .limit(sql_bound(query.limit))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        from_rows(rows)
    }

    async fn find_by_id(
        &self,
        id: &CommunityId,
    ) -> Result<Option<Community>, CommunityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        communities::table
            .find(id.as_uuid())
            .select(CommunityRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?
            .map(from_row)
            .transpose()
    }

    async fn find_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Community>, CommunityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        communities::table
            .filter(communities::slug.eq(slug))
            .select(CommunityRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?
            .map(from_row)
            .transpose()
    }

    async fn find_many(
        &self,
        ids: &[CommunityId],
    ) -> Result<Vec<Community>, CommunityRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = communities::table
            .filter(communities::id.eq_any(uuids))
            .select(CommunityRow::as_select())
            .order((communities::name.asc(), communities::id.asc()))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        from_rows(rows)
    }

    async fn insert(&self, community: &Community) -> Result<(), CommunityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(communities::table)
            .values(&to_row(community))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|error| write_error(error, &community.slug))
    }

    async fn update(&self, community: &Community) -> Result<bool, CommunityRepositoryError> {
        let changes = CommunityUpdate {
            name: &community.name,
            slug: &community.slug,
            category: community.category.as_str(),
            description: &community.description,
            privacy: community.privacy.as_str(),
        };
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let affected = diesel::update(communities::table.find(community.id.as_uuid()))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(|error| write_error(error, &community.slug))?;
        Ok(affected > 0)
    }

    async fn delete(&self, id: &CommunityId) -> Result<bool, CommunityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let affected = diesel::delete(communities::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(affected > 0)
    }

    async fn find_membership(
        &self,
        community_id: &CommunityId,
        user_id: &UserId,
    ) -> Result<Option<CommunityMembership>, CommunityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = community_memberships::table
            .find((community_id.as_uuid(), user_id.as_uuid()))
            .select(MembershipRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        Ok(row.map(membership_from_row))
    }

    async fn add_membership(
        &self,
        membership: &CommunityMembership,
    ) -> Result<bool, CommunityRepositoryError> {
        let community_id = *membership.community_id.as_uuid();
        let row = MembershipRow {
            community_id,
            user_id: *membership.user_id.as_uuid(),
            auto_assigned: membership.auto_assigned,
            joined_at: membership.joined_at,
        };
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                // Lock the community row so concurrent joins serialise.
                communities::table
                    .find(community_id)
                    .select(communities::id)
                    .for_update()
                    .first::<Uuid>(conn)
                    .await?;
                let inserted = diesel::insert_into(community_memberships::table)
                    .values(&row)
                    .on_conflict_do_nothing()
                    .execute(conn)
                    .await?;
                if inserted == 0 {
                    return Ok(false);
                }
                diesel::update(communities::table.find(community_id))
                    .set(communities::member_count.eq(communities::member_count + 1))
                    .execute(conn)
                    .await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(diesel_error)
    }

    async fn remove_membership(
        &self,
        community_id: &CommunityId,
        user_id: &UserId,
    ) -> Result<bool, CommunityRepositoryError> {
        let community_id = *community_id.as_uuid();
        let user_id = *user_id.as_uuid();
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                let removed =
                    diesel::delete(community_memberships::table.find((community_id, user_id)))
                        .execute(conn)
                        .await?;
                if removed == 0 {
                    return Ok(false);
                }
                diesel::update(
                    communities::table
                        .find(community_id)
                        .filter(communities::member_count.gt(0)),
                )
                .set(communities::member_count.eq(communities::member_count - 1))
                .execute(conn)
                .await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(diesel_error)
    }

    async fn memberships_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<CommunityMembership>, CommunityRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = community_memberships::table
            .filter(community_memberships::user_id.eq(user_id.as_uuid()))
            .select(MembershipRow::as_select())
            .order(community_memberships::joined_at.asc())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(rows.into_iter().map(membership_from_row).collect())
    }
}
