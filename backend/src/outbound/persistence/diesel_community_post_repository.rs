//! PostgreSQL-backed `CommunityPostRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{CommunityPostRepository, CommunityPostRepositoryError};
use crate::domain::{CommunityId, CommunityPost, PostId, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error, sql_bound};
use super::models::PostRow;
use super::pool::{DbPool, PoolError};
use super::schema::community_posts;

/// Diesel-backed post store.
#[derive(Clone)]
pub struct DieselCommunityPostRepository {
    pool: DbPool,
}

impl DieselCommunityPostRepository {
    /// Repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> CommunityPostRepositoryError {
    map_pool_error(error, CommunityPostRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> CommunityPostRepositoryError {
    map_diesel_error(
        error,
        CommunityPostRepositoryError::query,
        CommunityPostRepositoryError::connection,
    )
}

fn from_row(row: PostRow) -> CommunityPost {
    CommunityPost {
        id: PostId::from_uuid(row.id),
        community_id: CommunityId::from_uuid(row.community_id),
        author_id: UserId::from_uuid(row.author_id),
        content: row.content,
        created_at: row.created_at,
    }
}

#[async_trait]
impl CommunityPostRepository for DieselCommunityPostRepository {
    async fn list(
        &self,
        community_id: &CommunityId,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<CommunityPost>, CommunityPostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = community_posts::table
            .filter(community_posts::community_id.eq(community_id.as_uuid()))
            .select(PostRow::as_select())
            .order((community_posts::created_at.desc(), community_posts::id.asc()))
            .offset(sql_bound(offset))
            .limit(sql_bound(limit))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(rows.into_iter().map(from_row).collect())
    }

    async fn find(&self, id: &PostId) -> Result<Option<CommunityPost>, CommunityPostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = community_posts::table
            .find(id.as_uuid())
            .select(PostRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        Ok(row.map(from_row))
    }

    async fn insert(&self, post: &CommunityPost) -> Result<(), CommunityPostRepositoryError> {
        let row = PostRow {
            id: *post.id.as_uuid(),
            community_id: *post.community_id.as_uuid(),
            author_id: *post.author_id.as_uuid(),
            content: post.content.clone(),
            created_at: post.created_at,
        };
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(community_posts::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn delete(&self, id: &PostId) -> Result<bool, CommunityPostRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let affected = diesel::delete(community_posts::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(affected > 0)
    }
}
