//! Domain primitives, aggregates, and use-cases.
//!
//! Purpose: define strongly typed alumni-portal entities and the services
//! that operate on them. Persistence, hashing, notification, and payment
//! concerns are reached only through the traits in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: API error payload and stable error identifier.
//! - User, Email, Role, Actor: identities and authorisation roles.
//! - AlumniProfile with completion and visibility helpers.
//! - Community, DonationCampaign, Transaction, Event, Opportunity, Story.
//! - AuthService, ProfileService, CommunityService, DonationService, and the
//!   generic ContentService.

pub mod auth;
pub mod auth_service;
pub mod community;
pub mod community_service;
pub mod content;
pub mod content_service;
pub mod donation;
pub mod donation_service;
pub mod error;
pub mod ids;
pub mod ports;
pub mod profile;
pub mod profile_service;
pub(crate) mod slug;
pub mod trace_id;
pub mod user;

pub use self::auth::{
    LoginCredentials, LoginValidationError, PASSWORD_MAX_BYTES, PASSWORD_MIN_LENGTH, Registration,
    RegistrationValidationError,
};
pub use self::auth_service::{AuthService, AuthSettings, digest_token};
pub use self::community::matching::{CommunityTarget, match_communities};
pub use self::community::{
    Community, CommunityCategory, CommunityDraft, CommunityMembership, CommunityPost,
    CommunityPrivacy, CommunityValidationError, MembershipSync, validate_post_content,
};
pub use self::community_service::CommunityService;
pub use self::content::{
    ContentDraft, ContentValidationError, Event, EventDraft, EventInput, Opportunity,
    OpportunityDraft, OpportunityInput, OpportunityKind, Story, StoryDraft, StoryInput,
};
pub use self::content_service::{
    ContentService, EventService, OpportunityService, StoryService, map_content_validation,
};
pub use self::donation::{
    CampaignDraft, CampaignStatus, Currency, DonationCampaign, DonationValidationError,
    Transaction, TransactionStatus, validate_amount,
};
pub use self::donation_service::{DonationService, WebhookSecret, map_donation_validation};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ids::{
    CampaignId, CommunityId, EventId, InvalidIdError, OpportunityId, PostId, StoryId,
    TransactionId, UserId,
};
pub use self::profile::{
    AcademicInfo, AcademicInput, AlumniProfile, CommunityPreferences, CompletionStatus,
    ContactInfo, DirectoryFilter, PersonalInfo, PersonalInput, PrivacySettings, ProfessionalInfo,
    ProfileAccess, ProfileInput, ProfileValidationError, ProfileView, ProfileVisibility,
    PublicProfile, TRACKED_FIELDS, Viewer, VisibilityError, compute_completion,
};
pub use self::profile_service::ProfileService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    Actor, Email, EmailVerification, PasswordHash, Role, User, UserValidationError,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
