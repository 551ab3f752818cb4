//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. This
//! module provides the schema definitions required for OpenAPI documentation
//! using utoipa's external schema registration.
//!
//! The schema wrappers mirror the serialised shape of their domain types but
//! live in the inbound adapter layer where framework concerns belong.

#![expect(
    dead_code,
    reason = "Schema mirrors are only read by utoipa during document generation"
)]

use chrono::{DateTime, NaiveDate, Utc};
use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
///
/// Stable machine-readable error codes returned in API error responses.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Authentication failed or is missing.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The request conflicts with the current state of a resource.
    #[schema(rename = "conflict")]
    Conflict,
    /// A backing service is temporarily unavailable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
///
/// API error response payload with machine-readable code and human-readable
/// message.
#[derive(ToSchema)]
#[schema(as = crate::domain::Error)]
#[serde(rename_all = "camelCase")]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "missing required field: firstName")]
    message: String,
    /// Correlation identifier for tracing this error across systems.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Supplementary details, usually `{field, code}`.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::CompletionStatus`].
#[derive(ToSchema)]
#[schema(as = crate::domain::CompletionStatus)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStatusSchema {
    #[schema(example = 75)]
    percentage: u8,
    #[schema(example = json!(["bio", "linkedinUrl"]))]
    missing_fields: Vec<String>,
    is_complete: bool,
}

/// OpenAPI schema for [`crate::domain::AlumniProfile`], the owner's view.
#[derive(ToSchema)]
#[schema(as = crate::domain::AlumniProfile)]
#[serde(rename_all = "camelCase")]
pub struct AlumniProfileSchema {
    #[schema(value_type = String, format = Uuid)]
    user_id: String,
    personal: PersonalSchema,
    academic: AcademicSchema,
    #[schema(value_type = Object)]
    professional: serde_json::Value,
    #[schema(value_type = Object)]
    contact: serde_json::Value,
    #[schema(value_type = Object)]
    community_preferences: serde_json::Value,
    #[schema(value_type = Object)]
    privacy: serde_json::Value,
    completion: CompletionStatusSchema,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Personal section of a profile.
#[derive(ToSchema)]
#[schema(as = crate::domain::PersonalInfo)]
#[serde(rename_all = "camelCase")]
pub struct PersonalSchema {
    first_name: String,
    last_name: String,
    gender: Option<String>,
    date_of_birth: Option<NaiveDate>,
    bio: Option<String>,
    photo_url: Option<String>,
}

/// Academic section of a profile.
#[derive(ToSchema)]
#[schema(as = crate::domain::AcademicInfo)]
#[serde(rename_all = "camelCase")]
pub struct AcademicSchema {
    #[schema(example = 2015)]
    promotion_year: i32,
    faculty: String,
    department: Option<String>,
    degree: Option<String>,
}

/// OpenAPI schema for [`crate::domain::PublicProfile`].
///
/// Optional sections appear only when the owner's privacy switches allow.
#[derive(ToSchema)]
#[schema(as = crate::domain::PublicProfile)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfileSchema {
    #[schema(value_type = String, format = Uuid)]
    user_id: String,
    first_name: String,
    last_name: String,
    photo_url: Option<String>,
    bio: Option<String>,
    completion_percentage: u8,
    academic: Option<AcademicSchema>,
    #[schema(value_type = Option<Object>)]
    professional: Option<serde_json::Value>,
    city: Option<String>,
    country: Option<String>,
    linkedin_url: Option<String>,
    website_url: Option<String>,
    email: Option<String>,
    phone: Option<String>,
}

/// OpenAPI schema for [`crate::domain::Community`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Community)]
#[serde(rename_all = "camelCase")]
pub struct CommunitySchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    #[schema(example = "Promotion 2015")]
    name: String,
    #[schema(example = "promotion-2015")]
    slug: String,
    #[schema(example = "promotion")]
    category: String,
    description: String,
    #[schema(example = "public")]
    privacy: String,
    member_count: i64,
    created_at: DateTime<Utc>,
}

/// OpenAPI schema for [`crate::domain::CommunityMembership`].
#[derive(ToSchema)]
#[schema(as = crate::domain::CommunityMembership)]
#[serde(rename_all = "camelCase")]
pub struct MembershipSchema {
    #[schema(value_type = String, format = Uuid)]
    community_id: String,
    #[schema(value_type = String, format = Uuid)]
    user_id: String,
    auto_assigned: bool,
    joined_at: DateTime<Utc>,
}

/// OpenAPI schema for [`crate::domain::CommunityPost`].
#[derive(ToSchema)]
#[schema(as = crate::domain::CommunityPost)]
#[serde(rename_all = "camelCase")]
pub struct PostSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    #[schema(value_type = String, format = Uuid)]
    community_id: String,
    #[schema(value_type = String, format = Uuid)]
    author_id: String,
    content: String,
    created_at: DateTime<Utc>,
}

/// OpenAPI schema for [`crate::domain::DonationCampaign`].
///
/// Amounts are in minor currency units.
#[derive(ToSchema)]
#[schema(as = crate::domain::DonationCampaign)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    title: String,
    description: String,
    #[schema(example = 500_000)]
    target_amount: i64,
    current_amount: i64,
    #[schema(example = "EUR")]
    currency: String,
    #[schema(example = "active")]
    status: String,
    deadline: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = Uuid)]
    created_by: String,
    created_at: DateTime<Utc>,
}

/// OpenAPI schema for [`crate::domain::Transaction`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Transaction)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    #[schema(value_type = String, format = Uuid)]
    donation_id: String,
    #[schema(value_type = Option<String>, format = Uuid)]
    user_id: Option<String>,
    amount: i64,
    currency: String,
    #[schema(example = "pending")]
    status: String,
    #[schema(example = "don_4f1c2e")]
    provider_reference: String,
    checkout_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// OpenAPI schema for [`crate::domain::Event`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Event)]
#[serde(rename_all = "camelCase")]
pub struct EventSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    title: String,
    description: String,
    location: String,
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = Uuid)]
    author_id: String,
    created_at: DateTime<Utc>,
}

/// OpenAPI schema for [`crate::domain::Opportunity`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Opportunity)]
#[serde(rename_all = "camelCase")]
pub struct OpportunitySchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    title: String,
    organization: String,
    #[schema(example = "job")]
    kind: String,
    description: String,
    location: String,
    apply_url: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = Uuid)]
    author_id: String,
    created_at: DateTime<Utc>,
}

/// OpenAPI schema for [`crate::domain::Story`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Story)]
#[serde(rename_all = "camelCase")]
pub struct StorySchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    title: String,
    body: String,
    #[schema(value_type = String, format = Uuid)]
    author_id: String,
    created_at: DateTime<Utc>,
}

macro_rules! page_schema {
    ($(#[$meta:meta])* $name:ident, $item:ty) => {
        $(#[$meta])*
        #[derive(ToSchema)]
        #[serde(rename_all = "camelCase")]
        pub struct $name {
            data: Vec<$item>,
            /// Cursor for the following page; absent on the last page.
            next_cursor: Option<String>,
        }
    };
}

page_schema!(
    /// One page of directory entries.
    ProfilePageSchema,
    PublicProfileSchema
);
page_schema!(
    /// One page of communities.
    CommunityPageSchema,
    CommunitySchema
);
page_schema!(
    /// One page of community posts.
    PostPageSchema,
    PostSchema
);
page_schema!(
    /// One page of donation campaigns.
    CampaignPageSchema,
    CampaignSchema
);
page_schema!(
    /// One page of transactions.
    TransactionPageSchema,
    TransactionSchema
);
page_schema!(
    /// One page of events.
    EventPageSchema,
    EventSchema
);
page_schema!(
    /// One page of opportunities.
    OpportunityPageSchema,
    OpportunitySchema
);
page_schema!(
    /// One page of stories.
    StoryPageSchema,
    StorySchema
);
