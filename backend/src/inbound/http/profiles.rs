//! Alumni profile HTTP handlers.
//!
//! ```text
//! POST /api/v1/profile
//! GET|PUT|DELETE /api/v1/profile
//! GET /api/v1/profile/completion
//! GET /api/v1/profiles?promotionYear=2015&faculty=Engineering
//! GET /api/v1/profiles/{userId}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{
    AlumniProfile, CompletionStatus, DirectoryFilter, ProfileInput, ProfileView, PublicProfile,
    UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{
    AlumniProfileSchema, CompletionStatusSchema, ErrorSchema, ProfilePageSchema,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, PageQuery, parse_id};
use pagination::Page;

/// Directory filters and pagination.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DirectoryQuery {
    pub promotion_year: Option<i32>,
    pub faculty: Option<String>,
    pub country: Option<String>,
    pub profession: Option<String>,
    /// Page size between 1 and 100. Defaults to 20.
    pub limit: Option<usize>,
    /// Opaque cursor from a previous page's `nextCursor`.
    pub cursor: Option<String>,
}

impl DirectoryQuery {
    fn page(&self) -> PageQuery {
        PageQuery {
            limit: self.limit,
            cursor: self.cursor.clone(),
        }
    }

    fn filter(&self) -> DirectoryFilter {
        DirectoryFilter {
            promotion_year: self.promotion_year,
            faculty: self.faculty.clone(),
            country: self.country.clone(),
            profession: self.profession.clone(),
        }
    }
}

/// Create the caller's profile.
///
/// Community memberships are assigned from the new profile.
#[utoipa::path(
    post,
    path = "/api/v1/profile",
    request_body(content = AlumniProfileSchema, description = "Profile sections"),
    responses(
        (status = 201, description = "Profile created", body = AlumniProfileSchema),
        (status = 400, description = "Missing or invalid field", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 409, description = "Profile already exists", body = ErrorSchema)
    ),
    tags = ["profiles"],
    operation_id = "createProfile"
)]
#[post("/profile")]
pub async fn create_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ProfileInput>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let profile = state.profiles.create(&user_id, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(profile))
}

/// The caller's own profile, unfiltered.
#[utoipa::path(
    get,
    path = "/api/v1/profile",
    responses(
        (status = 200, description = "Own profile", body = AlumniProfileSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "No profile yet", body = ErrorSchema)
    ),
    tags = ["profiles"],
    operation_id = "getOwnProfile"
)]
#[get("/profile")]
pub async fn get_own_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<AlumniProfile>> {
    let user_id = session.require_user_id()?;
    Ok(web::Json(state.profiles.get_own(&user_id).await?))
}

/// Replace the submitted sections of the caller's profile.
#[utoipa::path(
    put,
    path = "/api/v1/profile",
    request_body(content = AlumniProfileSchema, description = "Sections to replace"),
    responses(
        (status = 200, description = "Profile updated", body = AlumniProfileSchema),
        (status = 400, description = "Missing or invalid field", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "No profile yet", body = ErrorSchema)
    ),
    tags = ["profiles"],
    operation_id = "updateProfile"
)]
#[put("/profile")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ProfileInput>,
) -> ApiResult<web::Json<AlumniProfile>> {
    let user_id = session.require_user_id()?;
    let profile = state.profiles.update(&user_id, payload.into_inner()).await?;
    Ok(web::Json(profile))
}

/// Delete the caller's profile and its automatic memberships.
#[utoipa::path(
    delete,
    path = "/api/v1/profile",
    responses(
        (status = 204, description = "Profile deleted"),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "No profile yet", body = ErrorSchema)
    ),
    tags = ["profiles"],
    operation_id = "deleteProfile"
)]
#[delete("/profile")]
pub async fn delete_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    state.profiles.delete(&user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/v1/profile/completion",
    responses(
        (status = 200, description = "Completion status", body = CompletionStatusSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "No profile yet", body = ErrorSchema)
    ),
    tags = ["profiles"],
    operation_id = "profileCompletion"
)]
#[get("/profile/completion")]
pub async fn profile_completion(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<CompletionStatus>> {
    let user_id = session.require_user_id()?;
    Ok(web::Json(state.profiles.completion(&user_id).await?))
}

/// Alumni directory. Anonymous callers only see public profiles.
#[utoipa::path(
    get,
    path = "/api/v1/profiles",
    params(DirectoryQuery),
    responses(
        (status = 200, description = "Directory page", body = ProfilePageSchema),
        (status = 400, description = "Invalid pagination", body = ErrorSchema)
    ),
    tags = ["profiles"],
    operation_id = "listProfiles",
    security([])
)]
#[get("/profiles")]
pub async fn list_profiles(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<DirectoryQuery>,
) -> ApiResult<web::Json<Page<PublicProfile>>> {
    let page = query.page().to_request()?;
    let viewer = state.viewer(&session).await?;
    let listing = state
        .profiles
        .directory(&viewer, query.filter(), &page)
        .await?;
    Ok(web::Json(listing))
}

/// Another alumnus's profile, filtered by their privacy settings.
#[utoipa::path(
    get,
    path = "/api/v1/profiles/{userId}",
    params(("userId" = String, Path, description = "Profile owner id")),
    responses(
        (status = 200, description = "Profile view", body = crate::inbound::http::schemas::PublicProfileSchema),
        (status = 400, description = "Malformed id", body = ErrorSchema),
        (status = 401, description = "Sign-in required", body = ErrorSchema),
        (status = 403, description = "Profile is private", body = ErrorSchema),
        (status = 404, description = "No such profile", body = ErrorSchema)
    ),
    tags = ["profiles"],
    operation_id = "getProfile",
    security([])
)]
#[get("/profiles/{user_id}")]
pub async fn get_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ProfileView>> {
    let target: UserId = parse_id(&path, FieldName::new("userId"))?;
    let viewer = state.viewer(&session).await?;
    Ok(web::Json(state.profiles.public_view(&target, &viewer).await?))
}
