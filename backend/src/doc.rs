//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every `/api/v1` handler, the health checks, the
//! schema mirrors from [`crate::inbound::http::schemas`], and the session
//! cookie security scheme. Swagger UI serves it at `/docs` in debug builds.

use crate::inbound::http::auth::{CredentialsRequest, UserResponse, VerifyRequest};
use crate::inbound::http::communities::{CommunityRequest, PostRequest};
use crate::inbound::http::donations::{CampaignRequest, ContributionRequest, WebhookRequest};
use crate::inbound::http::health::HealthStatus;
use crate::inbound::http::schemas::{
    AcademicSchema, AlumniProfileSchema, CampaignPageSchema, CampaignSchema, CommunityPageSchema,
    CommunitySchema, CompletionStatusSchema, ErrorCodeSchema, ErrorSchema, EventPageSchema,
    EventSchema, MembershipSchema, OpportunityPageSchema, OpportunitySchema, PersonalSchema,
    PostPageSchema, PostSchema, ProfilePageSchema, PublicProfileSchema, StoryPageSchema,
    StorySchema, TransactionPageSchema, TransactionSchema,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/auth/login.",
            ))),
        );
    }
}

/// OpenAPI document for the alumni portal.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Alumni portal API",
        description = "Accounts, alumni profiles, communities, donations, and published content."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::register,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::auth::verify_email,
        crate::inbound::http::auth::current_user,
        crate::inbound::http::profiles::create_profile,
        crate::inbound::http::profiles::get_own_profile,
        crate::inbound::http::profiles::update_profile,
        crate::inbound::http::profiles::delete_profile,
        crate::inbound::http::profiles::profile_completion,
        crate::inbound::http::profiles::list_profiles,
        crate::inbound::http::profiles::get_profile,
        crate::inbound::http::communities::list_communities,
        crate::inbound::http::communities::create_community,
        crate::inbound::http::communities::my_communities,
        crate::inbound::http::communities::get_community,
        crate::inbound::http::communities::update_community,
        crate::inbound::http::communities::delete_community,
        crate::inbound::http::communities::join_community,
        crate::inbound::http::communities::leave_community,
        crate::inbound::http::communities::list_posts,
        crate::inbound::http::communities::create_post,
        crate::inbound::http::communities::delete_post,
        crate::inbound::http::donations::list_campaigns,
        crate::inbound::http::donations::create_campaign,
        crate::inbound::http::donations::get_campaign,
        crate::inbound::http::donations::update_campaign,
        crate::inbound::http::donations::close_campaign,
        crate::inbound::http::donations::delete_campaign,
        crate::inbound::http::donations::contribute,
        crate::inbound::http::donations::my_transactions,
        crate::inbound::http::donations::get_transaction,
        crate::inbound::http::donations::payment_webhook,
        crate::inbound::http::content::list_events,
        crate::inbound::http::content::create_event,
        crate::inbound::http::content::get_event,
        crate::inbound::http::content::update_event,
        crate::inbound::http::content::delete_event,
        crate::inbound::http::content::list_opportunities,
        crate::inbound::http::content::create_opportunity,
        crate::inbound::http::content::get_opportunity,
        crate::inbound::http::content::update_opportunity,
        crate::inbound::http::content::delete_opportunity,
        crate::inbound::http::content::list_stories,
        crate::inbound::http::content::create_story,
        crate::inbound::http::content::get_story,
        crate::inbound::http::content::update_story,
        crate::inbound::http::content::delete_story,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        CredentialsRequest,
        VerifyRequest,
        UserResponse,
        PersonalSchema,
        AcademicSchema,
        AlumniProfileSchema,
        PublicProfileSchema,
        CompletionStatusSchema,
        ProfilePageSchema,
        CommunityRequest,
        PostRequest,
        CommunitySchema,
        MembershipSchema,
        PostSchema,
        CommunityPageSchema,
        PostPageSchema,
        CampaignRequest,
        ContributionRequest,
        WebhookRequest,
        CampaignSchema,
        TransactionSchema,
        CampaignPageSchema,
        TransactionPageSchema,
        EventSchema,
        OpportunitySchema,
        StorySchema,
        EventPageSchema,
        OpportunityPageSchema,
        StoryPageSchema,
        HealthStatus,
    )),
    tags(
        (name = "auth", description = "Registration, login, and email verification"),
        (name = "profiles", description = "Alumni profiles and the directory"),
        (name = "communities", description = "Communities, memberships, and posts"),
        (name = "donations", description = "Fundraising campaigns and payments"),
        (name = "content", description = "Events, opportunities, and stories"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the generated OpenAPI document.

    use super::*;
    use rstest::rstest;
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    // Note: utoipa replaces :: with . in schema names
    const ERROR_SCHEMA_NAME: &str = "crate.domain.Error";

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    fn error_schema_has_required_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get(ERROR_SCHEMA_NAME).expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
        assert_object_schema_has_field(error_schema, "traceId");
    }

    #[rstest]
    #[case("/api/v1/auth/login")]
    #[case("/api/v1/profiles/{userId}")]
    #[case("/api/v1/communities/{id}/posts/{postId}")]
    #[case("/api/v1/donations/{id}/contribute")]
    #[case("/api/v1/webhooks/payments")]
    #[case("/api/v1/events/{id}")]
    #[case("/health/ready")]
    fn documents_the_route(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }

    #[rstest]
    fn session_cookie_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("SessionCookie"));
    }
}
