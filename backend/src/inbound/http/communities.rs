//! Community HTTP handlers.
//!
//! ```text
//! GET /api/v1/communities?category=faculty&limit=20
//! POST /api/v1/communities {"name":"Engineering","category":"faculty"}
//! GET /api/v1/communities/mine
//! GET|PUT|DELETE /api/v1/communities/{id}
//! POST /api/v1/communities/{id}/join
//! POST /api/v1/communities/{id}/leave
//! GET|POST /api/v1/communities/{id}/posts
//! DELETE /api/v1/communities/{id}/posts/{postId}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    Community, CommunityCategory, CommunityDraft, CommunityId, CommunityPost, CommunityPrivacy,
    CommunityValidationError, Error, PostId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{
    CommunityPageSchema, CommunitySchema, ErrorSchema, MembershipSchema, PostPageSchema,
    PostSchema,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, PageQuery, parse_id};
use pagination::Page;

/// Body for creating or replacing a community.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommunityRequest {
    #[schema(example = "Engineering alumni")]
    pub name: String,
    /// Derived from `name` when omitted.
    pub slug: Option<String>,
    #[schema(example = "faculty")]
    pub category: String,
    pub description: Option<String>,
    /// `public` (default) or `private`.
    pub privacy: Option<String>,
}

impl CommunityRequest {
    fn into_draft(self) -> Result<CommunityDraft, CommunityValidationError> {
        let category: CommunityCategory = self.category.parse()?;
        let privacy = match self.privacy.as_deref() {
            Some(raw) => raw.parse()?,
            None => CommunityPrivacy::Public,
        };
        CommunityDraft::try_new(
            &self.name,
            self.slug.as_deref(),
            category,
            self.description.as_deref(),
            privacy,
        )
    }
}

/// Body of `POST /communities/{id}/posts`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct PostRequest {
    pub content: String,
}

/// `?category=` filter plus pagination.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CommunityListQuery {
    /// One of `promotion`, `faculty`, `department`, `region`, `profession`.
    pub category: Option<String>,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

fn map_community_validation(error: CommunityValidationError) -> Error {
    let code = match error {
        CommunityValidationError::Missing { .. } => "missing_field",
        _ => "invalid_field",
    };
    Error::invalid_request(error.to_string())
        .with_details(json!({ "field": error.field(), "code": code }))
}

fn community_id(raw: &str) -> Result<CommunityId, Error> {
    parse_id(raw, FieldName::new("id"))
}

#[utoipa::path(
    get,
    path = "/api/v1/communities",
    params(CommunityListQuery),
    responses(
        (status = 200, description = "Communities", body = CommunityPageSchema),
        (status = 400, description = "Invalid filter or pagination", body = ErrorSchema)
    ),
    tags = ["communities"],
    operation_id = "listCommunities",
    security([])
)]
#[get("/communities")]
pub async fn list_communities(
    state: web::Data<HttpState>,
    query: web::Query<CommunityListQuery>,
) -> ApiResult<web::Json<Page<Community>>> {
    let page = PageQuery {
        limit: query.limit,
        cursor: query.cursor.clone(),
    }
    .to_request()?;
    let category = query
        .category
        .as_deref()
        .map(str::parse::<CommunityCategory>)
        .transpose()
        .map_err(map_community_validation)?;
    Ok(web::Json(state.communities.list(category, &page).await?))
}

/// Create a community. Administrators only.
#[utoipa::path(
    post,
    path = "/api/v1/communities",
    request_body = CommunityRequest,
    responses(
        (status = 201, description = "Community created", body = CommunitySchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Administrator role required", body = ErrorSchema),
        (status = 409, description = "Slug already in use", body = ErrorSchema)
    ),
    tags = ["communities"],
    operation_id = "createCommunity"
)]
#[post("/communities")]
pub async fn create_community(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CommunityRequest>,
) -> ApiResult<HttpResponse> {
    let actor = state.require_actor(&session).await?;
    let draft = payload
        .into_inner()
        .into_draft()
        .map_err(map_community_validation)?;
    let community = state.communities.create(&actor, draft).await?;
    Ok(HttpResponse::Created().json(community))
}

/// Communities the caller belongs to.
#[utoipa::path(
    get,
    path = "/api/v1/communities/mine",
    responses(
        (status = 200, description = "Joined communities", body = [CommunitySchema]),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["communities"],
    operation_id = "myCommunities"
)]
#[get("/communities/mine")]
pub async fn my_communities(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Community>>> {
    let user_id = session.require_user_id()?;
    Ok(web::Json(state.communities.my_communities(&user_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/communities/{id}",
    params(("id" = String, Path, description = "Community id")),
    responses(
        (status = 200, description = "Community", body = CommunitySchema),
        (status = 400, description = "Malformed id", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["communities"],
    operation_id = "getCommunity",
    security([])
)]
#[get("/communities/{id}")]
pub async fn get_community(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Community>> {
    let id = community_id(&path)?;
    Ok(web::Json(state.communities.get(&id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/communities/{id}",
    params(("id" = String, Path, description = "Community id")),
    request_body = CommunityRequest,
    responses(
        (status = 200, description = "Community updated", body = CommunitySchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Administrator role required", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Slug already in use", body = ErrorSchema)
    ),
    tags = ["communities"],
    operation_id = "updateCommunity"
)]
#[put("/communities/{id}")]
pub async fn update_community(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<CommunityRequest>,
) -> ApiResult<web::Json<Community>> {
    let id = community_id(&path)?;
    let actor = state.require_actor(&session).await?;
    let draft = payload
        .into_inner()
        .into_draft()
        .map_err(map_community_validation)?;
    Ok(web::Json(state.communities.update(&actor, &id, draft).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/communities/{id}",
    params(("id" = String, Path, description = "Community id")),
    responses(
        (status = 204, description = "Community deleted"),
        (status = 403, description = "Administrator role required", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["communities"],
    operation_id = "deleteCommunity"
)]
#[delete("/communities/{id}")]
pub async fn delete_community(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = community_id(&path)?;
    let actor = state.require_actor(&session).await?;
    state.communities.delete(&actor, &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Join a community manually.
#[utoipa::path(
    post,
    path = "/api/v1/communities/{id}/join",
    params(("id" = String, Path, description = "Community id")),
    responses(
        (status = 201, description = "Joined", body = MembershipSchema),
        (status = 403, description = "Community is private", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Already a member", body = ErrorSchema)
    ),
    tags = ["communities"],
    operation_id = "joinCommunity"
)]
#[post("/communities/{id}/join")]
pub async fn join_community(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = community_id(&path)?;
    let actor = state.require_actor(&session).await?;
    let membership = state.communities.join(&actor, &id).await?;
    Ok(HttpResponse::Created().json(membership))
}

#[utoipa::path(
    post,
    path = "/api/v1/communities/{id}/leave",
    params(("id" = String, Path, description = "Community id")),
    responses(
        (status = 204, description = "Left the community"),
        (status = 404, description = "Not a member", body = ErrorSchema)
    ),
    tags = ["communities"],
    operation_id = "leaveCommunity"
)]
#[post("/communities/{id}/leave")]
pub async fn leave_community(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = community_id(&path)?;
    let actor = state.require_actor(&session).await?;
    state.communities.leave(&actor, &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Posts, newest first. Private communities are members only.
#[utoipa::path(
    get,
    path = "/api/v1/communities/{id}/posts",
    params(("id" = String, Path, description = "Community id"), PageQuery),
    responses(
        (status = 200, description = "Posts", body = PostPageSchema),
        (status = 403, description = "Members only", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["communities"],
    operation_id = "listCommunityPosts",
    security([])
)]
#[get("/communities/{id}/posts")]
pub async fn list_posts(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> ApiResult<web::Json<Page<CommunityPost>>> {
    let id = community_id(&path)?;
    let page = query.to_request()?;
    let viewer = state.viewer(&session).await?;
    Ok(web::Json(state.communities.list_posts(&viewer, &id, &page).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/communities/{id}/posts",
    params(("id" = String, Path, description = "Community id")),
    request_body = PostRequest,
    responses(
        (status = 201, description = "Post published", body = PostSchema),
        (status = 400, description = "Empty or oversized content", body = ErrorSchema),
        (status = 403, description = "Members only", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["communities"],
    operation_id = "createCommunityPost"
)]
#[post("/communities/{id}/posts")]
pub async fn create_post(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<PostRequest>,
) -> ApiResult<HttpResponse> {
    let id = community_id(&path)?;
    let actor = state.require_actor(&session).await?;
    let post = state
        .communities
        .create_post(&actor, &id, &payload.content)
        .await?;
    Ok(HttpResponse::Created().json(post))
}

#[utoipa::path(
    delete,
    path = "/api/v1/communities/{id}/posts/{postId}",
    params(
        ("id" = String, Path, description = "Community id"),
        ("postId" = String, Path, description = "Post id")
    ),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 403, description = "Author or moderator only", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["communities"],
    operation_id = "deleteCommunityPost"
)]
#[delete("/communities/{id}/posts/{post_id}")]
pub async fn delete_post(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (raw_community, raw_post) = path.into_inner();
    let id = community_id(&raw_community)?;
    let post_id: PostId = parse_id(&raw_post, FieldName::new("postId"))?;
    let actor = state.require_actor(&session).await?;
    state.communities.delete_post(&actor, &id, &post_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
