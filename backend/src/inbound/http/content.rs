//! Events, opportunities, and alumni stories.
//!
//! ```text
//! GET /api/v1/events?upcoming=true
//! POST /api/v1/events {"title":"Gala","startsAt":"2026-06-01T18:00:00Z"}
//! GET|PUT|DELETE /api/v1/events/{id}
//! GET|POST /api/v1/opportunities, GET|PUT|DELETE /api/v1/opportunities/{id}
//! GET|POST /api/v1/stories, GET|PUT|DELETE /api/v1/stories/{id}
//! ```
//!
//! Anyone may read. Signed-in users publish; only the author or an
//! administrator may change or remove a record.

use std::str::FromStr;

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::ports::ContentRecord;
use crate::domain::{
    ContentDraft, ContentService, Error, Event, EventInput, Opportunity, OpportunityInput, Story,
    StoryInput, map_content_validation,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{
    ErrorSchema, EventPageSchema, EventSchema, OpportunityPageSchema, OpportunitySchema,
    StoryPageSchema, StorySchema,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, PageQuery, parse_id};
use pagination::Page;

/// Event listing query.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventListQuery {
    /// Skip events that have already ended.
    #[serde(default)]
    pub upcoming: bool,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

fn record_id<I: FromStr>(raw: &str) -> Result<I, Error> {
    parse_id(raw, FieldName::new("id"))
}

async fn create_record<T, D>(
    state: &HttpState,
    session: &SessionContext,
    service: &ContentService<T>,
    draft: Result<D, Error>,
) -> ApiResult<HttpResponse>
where
    T: ContentRecord + serde::Serialize,
    D: ContentDraft<Record = T>,
{
    let actor = state.require_actor(session).await?;
    let record = service.create(&actor, draft?).await?;
    Ok(HttpResponse::Created().json(record))
}

async fn update_record<T, D>(
    state: &HttpState,
    session: &SessionContext,
    service: &ContentService<T>,
    raw_id: &str,
    draft: Result<D, Error>,
) -> ApiResult<web::Json<T>>
where
    T: ContentRecord,
    T::Id: FromStr,
    D: ContentDraft<Record = T>,
{
    let id = record_id(raw_id)?;
    let actor = state.require_actor(session).await?;
    Ok(web::Json(service.update(&actor, &id, draft?).await?))
}

async fn delete_record<T>(
    state: &HttpState,
    session: &SessionContext,
    service: &ContentService<T>,
    raw_id: &str,
) -> ApiResult<HttpResponse>
where
    T: ContentRecord,
    T::Id: FromStr,
{
    let id = record_id(raw_id)?;
    let actor = state.require_actor(session).await?;
    service.delete(&actor, &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Events ordered by start time.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    params(EventListQuery),
    responses(
        (status = 200, description = "Events", body = EventPageSchema),
        (status = 400, description = "Invalid pagination", body = ErrorSchema)
    ),
    tags = ["content"],
    operation_id = "listEvents",
    security([])
)]
#[get("/events")]
pub async fn list_events(
    state: web::Data<HttpState>,
    query: web::Query<EventListQuery>,
) -> ApiResult<web::Json<Page<Event>>> {
    let page = PageQuery {
        limit: query.limit,
        cursor: query.cursor.clone(),
    }
    .to_request()?;
    Ok(web::Json(state.content.events.list(query.upcoming, &page).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/events",
    request_body(content = EventSchema, description = "title and startsAt are required"),
    responses(
        (status = 201, description = "Event created", body = EventSchema),
        (status = 400, description = "Missing or invalid field", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["content"],
    operation_id = "createEvent"
)]
#[post("/events")]
pub async fn create_event(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<EventInput>,
) -> ApiResult<HttpResponse> {
    let draft = payload.validate().map_err(map_content_validation);
    create_record(&state, &session, &state.content.events, draft).await
}

#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    params(("id" = String, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event", body = EventSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["content"],
    operation_id = "getEvent",
    security([])
)]
#[get("/events/{id}")]
pub async fn get_event(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Event>> {
    let id = record_id(&path)?;
    Ok(web::Json(state.content.events.get(&id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/events/{id}",
    params(("id" = String, Path, description = "Event id")),
    request_body = EventSchema,
    responses(
        (status = 200, description = "Event updated", body = EventSchema),
        (status = 400, description = "Missing or invalid field", body = ErrorSchema),
        (status = 403, description = "Author or administrator only", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["content"],
    operation_id = "updateEvent"
)]
#[put("/events/{id}")]
pub async fn update_event(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<EventInput>,
) -> ApiResult<web::Json<Event>> {
    let draft = payload.validate().map_err(map_content_validation);
    update_record(&state, &session, &state.content.events, &path, draft).await
}

#[utoipa::path(
    delete,
    path = "/api/v1/events/{id}",
    params(("id" = String, Path, description = "Event id")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 403, description = "Author or administrator only", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["content"],
    operation_id = "deleteEvent"
)]
#[delete("/events/{id}")]
pub async fn delete_event(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    delete_record(&state, &session, &state.content.events, &path).await
}

/// Opportunities, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/opportunities",
    params(PageQuery),
    responses(
        (status = 200, description = "Opportunities", body = OpportunityPageSchema),
        (status = 400, description = "Invalid pagination", body = ErrorSchema)
    ),
    tags = ["content"],
    operation_id = "listOpportunities",
    security([])
)]
#[get("/opportunities")]
pub async fn list_opportunities(
    state: web::Data<HttpState>,
    query: web::Query<PageQuery>,
) -> ApiResult<web::Json<Page<Opportunity>>> {
    let page = query.to_request()?;
    Ok(web::Json(state.content.opportunities.list(false, &page).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/opportunities",
    request_body(content = OpportunitySchema, description = "title, organization and kind are required"),
    responses(
        (status = 201, description = "Opportunity created", body = OpportunitySchema),
        (status = 400, description = "Missing or invalid field", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["content"],
    operation_id = "createOpportunity"
)]
#[post("/opportunities")]
pub async fn create_opportunity(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<OpportunityInput>,
) -> ApiResult<HttpResponse> {
    let draft = payload.validate().map_err(map_content_validation);
    create_record(&state, &session, &state.content.opportunities, draft).await
}

#[utoipa::path(
    get,
    path = "/api/v1/opportunities/{id}",
    params(("id" = String, Path, description = "Opportunity id")),
    responses(
        (status = 200, description = "Opportunity", body = OpportunitySchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["content"],
    operation_id = "getOpportunity",
    security([])
)]
#[get("/opportunities/{id}")]
pub async fn get_opportunity(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Opportunity>> {
    let id = record_id(&path)?;
    Ok(web::Json(state.content.opportunities.get(&id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/opportunities/{id}",
    params(("id" = String, Path, description = "Opportunity id")),
    request_body = OpportunitySchema,
    responses(
        (status = 200, description = "Opportunity updated", body = OpportunitySchema),
        (status = 400, description = "Missing or invalid field", body = ErrorSchema),
        (status = 403, description = "Author or administrator only", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["content"],
    operation_id = "updateOpportunity"
)]
#[put("/opportunities/{id}")]
pub async fn update_opportunity(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<OpportunityInput>,
) -> ApiResult<web::Json<Opportunity>> {
    let draft = payload.validate().map_err(map_content_validation);
    update_record(&state, &session, &state.content.opportunities, &path, draft).await
}

#[utoipa::path(
    delete,
    path = "/api/v1/opportunities/{id}",
    params(("id" = String, Path, description = "Opportunity id")),
    responses(
        (status = 204, description = "Opportunity deleted"),
        (status = 403, description = "Author or administrator only", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["content"],
    operation_id = "deleteOpportunity"
)]
#[delete("/opportunities/{id}")]
pub async fn delete_opportunity(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    delete_record(&state, &session, &state.content.opportunities, &path).await
}

/// Alumni stories, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/stories",
    params(PageQuery),
    responses(
        (status = 200, description = "Stories", body = StoryPageSchema),
        (status = 400, description = "Invalid pagination", body = ErrorSchema)
    ),
    tags = ["content"],
    operation_id = "listStories",
    security([])
)]
#[get("/stories")]
pub async fn list_stories(
    state: web::Data<HttpState>,
    query: web::Query<PageQuery>,
) -> ApiResult<web::Json<Page<Story>>> {
    let page = query.to_request()?;
    Ok(web::Json(state.content.stories.list(false, &page).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/stories",
    request_body(content = StorySchema, description = "title and body are required"),
    responses(
        (status = 201, description = "Story created", body = StorySchema),
        (status = 400, description = "Missing or invalid field", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["content"],
    operation_id = "createStory"
)]
#[post("/stories")]
pub async fn create_story(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<StoryInput>,
) -> ApiResult<HttpResponse> {
    let draft = payload.validate().map_err(map_content_validation);
    create_record(&state, &session, &state.content.stories, draft).await
}

#[utoipa::path(
    get,
    path = "/api/v1/stories/{id}",
    params(("id" = String, Path, description = "Story id")),
    responses(
        (status = 200, description = "Story", body = StorySchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["content"],
    operation_id = "getStory",
    security([])
)]
#[get("/stories/{id}")]
pub async fn get_story(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Story>> {
    let id = record_id(&path)?;
    Ok(web::Json(state.content.stories.get(&id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/stories/{id}",
    params(("id" = String, Path, description = "Story id")),
    request_body = StorySchema,
    responses(
        (status = 200, description = "Story updated", body = StorySchema),
        (status = 400, description = "Missing or invalid field", body = ErrorSchema),
        (status = 403, description = "Author or administrator only", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["content"],
    operation_id = "updateStory"
)]
#[put("/stories/{id}")]
pub async fn update_story(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<StoryInput>,
) -> ApiResult<web::Json<Story>> {
    let draft = payload.validate().map_err(map_content_validation);
    update_record(&state, &session, &state.content.stories, &path, draft).await
}

#[utoipa::path(
    delete,
    path = "/api/v1/stories/{id}",
    params(("id" = String, Path, description = "Story id")),
    responses(
        (status = 204, description = "Story deleted"),
        (status = 403, description = "Author or administrator only", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["content"],
    operation_id = "deleteStory"
)]
#[delete("/stories/{id}")]
pub async fn delete_story(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    delete_record(&state, &session, &state.content.stories, &path).await
}
