//! PostgreSQL-backed `ContentRepository` for events, opportunities, and
//! stories.
//!
//! One generic adapter type serves all three tables. The shared CRUD methods
//! come from `impl_content_repository!`; each kind supplies its own `list`
//! because ordering and the upcoming filter differ.

use std::marker::PhantomData;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{ContentListQuery, ContentRepository, ContentRepositoryError};
use crate::domain::{Event, EventId, Opportunity, OpportunityId, Story, StoryId, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error, sql_bound};
use super::models::{EventRow, OpportunityRow, StoryRow};
use super::pool::{DbPool, PoolError};
use super::schema::{events, opportunities, stories};

/// Diesel-backed store for one content kind `T`.
pub struct DieselContentRepository<T> {
    pool: DbPool,
    kind: PhantomData<fn() -> T>,
}

impl<T> DieselContentRepository<T> {
    /// Repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            kind: PhantomData,
        }
    }
}

impl<T> Clone for DieselContentRepository<T> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

fn pool_error(error: PoolError) -> ContentRepositoryError {
    map_pool_error(error, ContentRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> ContentRepositoryError {
    map_diesel_error(
        error,
        ContentRepositoryError::query,
        ContentRepositoryError::connection,
    )
}

fn event_to_row(event: &Event) -> EventRow {
    EventRow {
        id: *event.id.as_uuid(),
        title: event.title.clone(),
        description: event.description.clone(),
        location: event.location.clone(),
        starts_at: event.starts_at,
        ends_at: event.ends_at,
        author_id: *event.author_id.as_uuid(),
        created_at: event.created_at,
    }
}

fn event_from_row(row: EventRow) -> Result<Event, ContentRepositoryError> {
    Ok(Event {
        id: EventId::from_uuid(row.id),
        title: row.title,
        description: row.description,
        location: row.location,
        starts_at: row.starts_at,
        ends_at: row.ends_at,
        author_id: UserId::from_uuid(row.author_id),
        created_at: row.created_at,
    })
}

fn opportunity_to_row(opportunity: &Opportunity) -> OpportunityRow {
    OpportunityRow {
        id: *opportunity.id.as_uuid(),
        title: opportunity.title.clone(),
        organization: opportunity.organization.clone(),
        kind: opportunity.kind.as_str().to_owned(),
        description: opportunity.description.clone(),
        location: opportunity.location.clone(),
        apply_url: opportunity.apply_url.clone(),
        expires_at: opportunity.expires_at,
        author_id: *opportunity.author_id.as_uuid(),
        created_at: opportunity.created_at,
    }
}

fn opportunity_from_row(row: OpportunityRow) -> Result<Opportunity, ContentRepositoryError> {
    let kind = row.kind.parse().map_err(|_| {
        warn!(opportunity_id = %row.id, kind = %row.kind, "stored opportunity kind is invalid");
        ContentRepositoryError::query("stored opportunity has invalid kind")
    })?;
    Ok(Opportunity {
        id: OpportunityId::from_uuid(row.id),
        title: row.title,
        organization: row.organization,
        kind,
        description: row.description,
        location: row.location,
        apply_url: row.apply_url,
        expires_at: row.expires_at,
        author_id: UserId::from_uuid(row.author_id),
        created_at: row.created_at,
    })
}

fn story_to_row(story: &Story) -> StoryRow {
    StoryRow {
        id: *story.id.as_uuid(),
        title: story.title.clone(),
        body: story.body.clone(),
        author_id: *story.author_id.as_uuid(),
        created_at: story.created_at,
    }
}

fn story_from_row(row: StoryRow) -> Result<Story, ContentRepositoryError> {
    Ok(Story {
        id: StoryId::from_uuid(row.id),
        title: row.title,
        body: row.body,
        author_id: UserId::from_uuid(row.author_id),
        created_at: row.created_at,
    })
}

/// Generate the kind-independent `ContentRepository` methods.
macro_rules! impl_content_repository {
    (
        $record:ty, $table:ident, $row:ty,
        to_row: $to_row:path,
        from_row: $from_row:path,
        list: { $($list:tt)* }
    ) => {
        #[async_trait]
        impl ContentRepository<$record> for DieselContentRepository<$record> {
            async fn insert(&self, record: &$record) -> Result<(), ContentRepositoryError> {
                let mut conn = self.pool.get().await.map_err(pool_error)?;
                diesel::insert_into($table::table)
                    .values(&$to_row(record))
                    .execute(&mut conn)
                    .await
                    .map(|_| ())
                    .map_err(diesel_error)
            }

            async fn find(
                &self,
                id: &<$record as crate::domain::ports::ContentRecord>::Id,
            ) -> Result<Option<$record>, ContentRepositoryError> {
                let mut conn = self.pool.get().await.map_err(pool_error)?;
                $table::table
                    .find(id.as_uuid())
                    .select(<$row>::as_select())
                    .first(&mut conn)
                    .await
                    .optional()
                    .map_err(diesel_error)?
                    .map($from_row)
                    .transpose()
            }

            async fn update(&self, record: &$record) -> Result<bool, ContentRepositoryError> {
                let mut conn = self.pool.get().await.map_err(pool_error)?;
                let affected = diesel::update($table::table.find(record.id.as_uuid()))
                    .set(&$to_row(record))
                    .execute(&mut conn)
                    .await
                    .map_err(diesel_error)?;
                Ok(affected > 0)
            }

            async fn delete(
                &self,
                id: &<$record as crate::domain::ports::ContentRecord>::Id,
            ) -> Result<bool, ContentRepositoryError> {
                let mut conn = self.pool.get().await.map_err(pool_error)?;
                let affected = diesel::delete($table::table.find(id.as_uuid()))
                    .execute(&mut conn)
                    .await
                    .map_err(diesel_error)?;
                Ok(affected > 0)
            }

            $($list)*
        }
    };
}

impl_content_repository!(
    Event, events, EventRow,
    to_row: event_to_row,
    from_row: event_from_row,
    list: {
        async fn list(
            &self,
            query: &ContentListQuery,
        ) -> Result<Vec<Event>, ContentRepositoryError> {
            let mut statement = events::table.select(EventRow::as_select()).into_boxed();
            if let Some(now) = query.upcoming_at {
                // Upcoming while the event has not finished: its end, or its
                // start when no end is recorded, is still ahead.
                statement = statement.filter(
                    events::ends_at
                        .is_not_null()
                        .and(events::ends_at.assume_not_null().ge(now))
                        .or(events::ends_at.is_null().and(events::starts_at.ge(now))),
                );
            }
            let mut conn = self.pool.get().await.map_err(pool_error)?;
            let rows = statement
                .order((events::starts_at.asc(), events::id.asc()))
                .offset(sql_bound(query.offset))
                .limit(sql_bound(query.limit))
                .load(&mut conn)
                .await
                .map_err(diesel_error)?;
            rows.into_iter().map(event_from_row).collect()
        }
    }
);

impl_content_repository!(
    Opportunity, opportunities, OpportunityRow,
    to_row: opportunity_to_row,
    from_row: opportunity_from_row,
    list: {
        async fn list(
            &self,
            query: &ContentListQuery,
        ) -> Result<Vec<Opportunity>, ContentRepositoryError> {
            let mut conn = self.pool.get().await.map_err(pool_error)?;
            let rows = opportunities::table
                .select(OpportunityRow::as_select())
                .order((opportunities::created_at.desc(), opportunities::id.asc()))
                .offset(sql_bound(query.offset))
                .limit(sql_bound(query.limit))
                .load(&mut conn)
                .await
                .map_err(diesel_error)?;
            rows.into_iter().map(opportunity_from_row).collect()
        }
    }
);

impl_content_repository!(
    Story, stories, StoryRow,
    to_row: story_to_row,
    from_row: story_from_row,
    list: {
        async fn list(
            &self,
            query: &ContentListQuery,
        ) -> Result<Vec<Story>, ContentRepositoryError> {
            let mut conn = self.pool.get().await.map_err(pool_error)?;
            let rows = stories::table
                .select(StoryRow::as_select())
                .order((stories::created_at.desc(), stories::id.asc()))
                .offset(sql_bound(query.offset))
                .limit(sql_bound(query.limit))
                .load(&mut conn)
                .await
                .map_err(diesel_error)?;
            rows.into_iter().map(story_from_row).collect()
        }
    }
);
