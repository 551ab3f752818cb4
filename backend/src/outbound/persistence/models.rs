//! Diesel row structs. Internal to the persistence adapters.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{
    alumni_profiles, communities, community_memberships, community_posts, donation_campaigns,
    donation_transactions, events, opportunities, stories, users,
};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub verified: bool,
    pub verification_token_digest: Option<String>,
    pub verification_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = alumni_profiles)]
#[diesel(primary_key(user_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ProfileRow {
    pub user_id: Uuid,
    pub visibility: String,
    pub promotion_year: i32,
    pub faculty_key: String,
    pub country_key: Option<String>,
    pub profession_key: Option<String>,
    pub document: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Communities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = communities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CommunityRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub category: String,
    pub description: String,
    pub privacy: String,
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Editable community columns. `member_count` is owned by membership writes.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = communities)]
pub(crate) struct CommunityUpdate<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub category: &'a str,
    pub description: &'a str,
    pub privacy: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = community_memberships)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MembershipRow {
    pub community_id: Uuid,
    pub user_id: Uuid,
    pub auto_assigned: bool,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = community_posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PostRow {
    pub id: Uuid,
    pub community_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Donations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = donation_campaigns)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CampaignRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub target_amount: i64,
    pub current_amount: i64,
    pub currency: String,
    pub status: String,
    pub deadline: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Editable campaign columns. `current_amount` only moves through `credit`.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = donation_campaigns)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct CampaignUpdate<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub target_amount: i64,
    pub currency: &'a str,
    pub status: &'a str,
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = donation_transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TransactionRow {
    pub id: Uuid,
    pub donation_id: Uuid,
    pub user_id: Option<Uuid>,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub provider_reference: String,
    pub checkout_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct EventRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = opportunities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct OpportunityRow {
    pub id: Uuid,
    pub title: String,
    pub organization: String,
    pub kind: String,
    pub description: String,
    pub location: String,
    pub apply_url: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = stories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct StoryRow {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}
