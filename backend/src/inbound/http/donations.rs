//! Donation campaign, transaction, and payment webhook handlers.
//!
//! ```text
//! GET|POST /api/v1/donations
//! GET|PUT|DELETE /api/v1/donations/{id}
//! POST /api/v1/donations/{id}/close
//! POST /api/v1/donations/{id}/contribute {"amount":2500}
//! GET /api/v1/transactions/mine
//! GET /api/v1/transactions/{id}
//! POST /api/v1/webhooks/payments {"reference":"don_..."} X-Webhook-Token: ...
//! ```

use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{
    CampaignDraft, CampaignId, CampaignStatus, DonationCampaign, Error, Transaction,
    TransactionId, map_donation_validation,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{
    CampaignPageSchema, CampaignSchema, ErrorSchema, TransactionPageSchema, TransactionSchema,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, PageQuery, parse_id};
use pagination::Page;

/// Header carrying the gateway's shared webhook secret.
pub const WEBHOOK_TOKEN_HEADER: &str = "X-Webhook-Token";

/// Body for creating or replacing a campaign. Amounts are minor units.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRequest {
    #[schema(example = "New library wing")]
    pub title: String,
    pub description: Option<String>,
    #[schema(example = 500_000)]
    pub target_amount: i64,
    #[schema(example = "EUR")]
    pub currency: String,
    pub deadline: Option<DateTime<Utc>>,
    /// `active` or `closed`. Only honoured on update.
    pub status: Option<String>,
}

impl CampaignRequest {
    fn draft(&self) -> Result<CampaignDraft, Error> {
        CampaignDraft::try_new(
            &self.title,
            self.description.as_deref(),
            self.target_amount,
            &self.currency,
            self.deadline,
        )
        .map_err(map_donation_validation)
    }

    fn status(&self) -> Result<Option<CampaignStatus>, Error> {
        self.status
            .as_deref()
            .map(str::parse::<CampaignStatus>)
            .transpose()
            .map_err(|message| {
                Error::invalid_request(message)
                    .with_details(json!({ "field": "status", "code": "invalid_field" }))
            })
    }
}

/// Body of `POST /donations/{id}/contribute`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ContributionRequest {
    #[schema(example = 2500)]
    pub amount: i64,
}

/// Gateway callback body. Only the reference is read.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct WebhookRequest {
    #[schema(example = "don_4f1c2e")]
    pub reference: String,
}

fn campaign_id(raw: &str) -> Result<CampaignId, Error> {
    parse_id(raw, FieldName::new("id"))
}

/// Campaigns, active first then newest.
#[utoipa::path(
    get,
    path = "/api/v1/donations",
    params(PageQuery),
    responses(
        (status = 200, description = "Campaigns", body = CampaignPageSchema),
        (status = 400, description = "Invalid pagination", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "listCampaigns",
    security([])
)]
#[get("/donations")]
pub async fn list_campaigns(
    state: web::Data<HttpState>,
    query: web::Query<PageQuery>,
) -> ApiResult<web::Json<Page<DonationCampaign>>> {
    let page = query.to_request()?;
    Ok(web::Json(state.donations.list_campaigns(&page).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/donations",
    request_body = CampaignRequest,
    responses(
        (status = 201, description = "Campaign created", body = CampaignSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Administrator role required", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "createCampaign"
)]
#[post("/donations")]
pub async fn create_campaign(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CampaignRequest>,
) -> ApiResult<HttpResponse> {
    let actor = state.require_actor(&session).await?;
    let draft = payload.draft()?;
    let campaign = state.donations.create_campaign(&actor, draft).await?;
    Ok(HttpResponse::Created().json(campaign))
}

#[utoipa::path(
    get,
    path = "/api/v1/donations/{id}",
    params(("id" = String, Path, description = "Campaign id")),
    responses(
        (status = 200, description = "Campaign", body = CampaignSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "getCampaign",
    security([])
)]
#[get("/donations/{id}")]
pub async fn get_campaign(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<DonationCampaign>> {
    let id = campaign_id(&path)?;
    Ok(web::Json(state.donations.get_campaign(&id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/donations/{id}",
    params(("id" = String, Path, description = "Campaign id")),
    request_body = CampaignRequest,
    responses(
        (status = 200, description = "Campaign updated", body = CampaignSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Administrator role required", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "updateCampaign"
)]
#[put("/donations/{id}")]
pub async fn update_campaign(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<CampaignRequest>,
) -> ApiResult<web::Json<DonationCampaign>> {
    let id = campaign_id(&path)?;
    let actor = state.require_actor(&session).await?;
    let (draft, status) = (payload.draft()?, payload.status()?);
    let campaign = state
        .donations
        .update_campaign(&actor, &id, draft, status)
        .await?;
    Ok(web::Json(campaign))
}

/// Stop accepting contributions.
#[utoipa::path(
    post,
    path = "/api/v1/donations/{id}/close",
    params(("id" = String, Path, description = "Campaign id")),
    responses(
        (status = 200, description = "Campaign closed", body = CampaignSchema),
        (status = 403, description = "Administrator role required", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "closeCampaign"
)]
#[post("/donations/{id}/close")]
pub async fn close_campaign(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<DonationCampaign>> {
    let id = campaign_id(&path)?;
    let actor = state.require_actor(&session).await?;
    Ok(web::Json(state.donations.close_campaign(&actor, &id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/donations/{id}",
    params(("id" = String, Path, description = "Campaign id")),
    responses(
        (status = 204, description = "Campaign deleted"),
        (status = 403, description = "Administrator role required", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "deleteCampaign"
)]
#[delete("/donations/{id}")]
pub async fn delete_campaign(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = campaign_id(&path)?;
    let actor = state.require_actor(&session).await?;
    state.donations.delete_campaign(&actor, &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Start a contribution and return the checkout link.
///
/// Anonymous visitors may give; signed-in donors are recorded.
#[utoipa::path(
    post,
    path = "/api/v1/donations/{id}/contribute",
    params(("id" = String, Path, description = "Campaign id")),
    request_body = ContributionRequest,
    responses(
        (status = 201, description = "Pending transaction", body = TransactionSchema),
        (status = 400, description = "Invalid amount", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Campaign closed", body = ErrorSchema),
        (status = 503, description = "Payment gateway unavailable", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "contribute",
    security([])
)]
#[post("/donations/{id}/contribute")]
pub async fn contribute(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<ContributionRequest>,
) -> ApiResult<HttpResponse> {
    let id = campaign_id(&path)?;
    let donor = state.viewer(&session).await?.user_id();
    let transaction = state
        .donations
        .contribute(&id, donor, payload.amount)
        .await?;
    Ok(HttpResponse::Created().json(transaction))
}

#[utoipa::path(
    get,
    path = "/api/v1/transactions/mine",
    params(PageQuery),
    responses(
        (status = 200, description = "Caller's transactions", body = TransactionPageSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "myTransactions"
)]
#[get("/transactions/mine")]
pub async fn my_transactions(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<PageQuery>,
) -> ApiResult<web::Json<Page<Transaction>>> {
    let user_id = session.require_user_id()?;
    let page = query.to_request()?;
    Ok(web::Json(state.donations.my_transactions(&user_id, &page).await?))
}

/// Fetch a transaction, polling the gateway once while it is pending.
#[utoipa::path(
    get,
    path = "/api/v1/transactions/{id}",
    params(("id" = String, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Transaction", body = TransactionSchema),
        (status = 403, description = "Not your transaction", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 503, description = "Payment gateway unavailable", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "getTransaction"
)]
#[get("/transactions/{id}")]
pub async fn get_transaction(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Transaction>> {
    let id: TransactionId = parse_id(&path, FieldName::new("id"))?;
    let actor = state.require_actor(&session).await?;
    Ok(web::Json(state.donations.refresh_status(&actor, &id).await?))
}

/// Payment gateway callback.
///
/// The body only names the payment; its status is fetched from the gateway.
#[utoipa::path(
    post,
    path = "/api/v1/webhooks/payments",
    request_body = WebhookRequest,
    params(("X-Webhook-Token" = String, Header, description = "Shared webhook secret")),
    responses(
        (status = 200, description = "Transaction after reconciliation", body = TransactionSchema),
        (status = 401, description = "Invalid webhook token", body = ErrorSchema),
        (status = 404, description = "Unknown reference", body = ErrorSchema),
        (status = 503, description = "Payment gateway unavailable", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "paymentWebhook",
    security([])
)]
#[post("/webhooks/payments")]
pub async fn payment_webhook(
    state: web::Data<HttpState>,
    request: HttpRequest,
    payload: web::Json<WebhookRequest>,
) -> ApiResult<web::Json<Transaction>> {
    let token = request
        .headers()
        .get(WEBHOOK_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());
    let transaction = state
        .donations
        .handle_webhook(&payload.reference, token)
        .await?;
    Ok(web::Json(transaction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::domain::ports::GatewayPaymentStatus;
    use crate::inbound::http::test_utils::{TestBackend, WEBHOOK_TOKEN, login, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::Value;

    async fn json_body(response: actix_web::dev::ServiceResponse) -> Value {
        let body = actix_test::read_body(response).await;
        serde_json::from_slice(&body).expect("json body")
    }

    fn library_wing() -> CampaignRequest {
        CampaignRequest {
            title: "New library wing".to_owned(),
            description: Some("Shelves and study rooms".to_owned()),
            target_amount: 500_000,
            currency: "EUR".to_owned(),
            deadline: None,
            status: None,
        }
    }

    #[actix_web::test]
    async fn webhook_completes_once_and_replays_are_harmless() {
        let backend = TestBackend::new();
        backend.seed_user("root@alumni.example", Role::Admin).await;
        backend.seed_user("ada@example.org", Role::Alumni).await;
        let app = actix_test::init_service(test_app(backend.state.clone())).await;
        let admin = login(&app, "root@alumni.example").await;

        let created = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/donations")
                .cookie(admin)
                .set_json(library_wing())
                .to_request(),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let campaign = json_body(created).await;
        let campaign_id = campaign["id"].as_str().expect("id").to_owned();

        let ada = login(&app, "ada@example.org").await;
        let contributed = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/donations/{campaign_id}/contribute"))
                .cookie(ada.clone())
                .set_json(ContributionRequest { amount: 2500 })
                .to_request(),
        )
        .await;
        assert_eq!(contributed.status(), StatusCode::CREATED);
        let transaction = json_body(contributed).await;
        assert_eq!(transaction["status"], "pending");
        assert!(transaction["checkoutUrl"].is_string());
        let reference = transaction["providerReference"]
            .as_str()
            .expect("reference")
            .to_owned();

        backend
            .gateway
            .set_status(&reference, GatewayPaymentStatus::Accepted);
        for _ in 0..2 {
            let response = actix_test::call_service(
                &app,
                actix_test::TestRequest::post()
                    .uri("/api/v1/webhooks/payments")
                    .insert_header((WEBHOOK_TOKEN_HEADER, WEBHOOK_TOKEN))
                    .set_json(WebhookRequest {
                        reference: reference.clone(),
                    })
                    .to_request(),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(json_body(response).await["status"], "completed");
        }

        let campaign = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/v1/donations/{campaign_id}"))
                .to_request(),
        )
        .await;
        assert_eq!(json_body(campaign).await["currentAmount"], 2500);

        let mine = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/transactions/mine")
                .cookie(ada)
                .to_request(),
        )
        .await;
        assert_eq!(json_body(mine).await["data"][0]["amount"], 2500);
    }

    #[rstest]
    #[case(None)]
    #[case(Some("wrong-secret"))]
    #[actix_web::test]
    async fn webhooks_without_the_secret_are_rejected(#[case] token: Option<&str>) {
        let backend = TestBackend::new();
        let app = actix_test::init_service(test_app(backend.state.clone())).await;
        let mut request = actix_test::TestRequest::post()
            .uri("/api/v1/webhooks/payments")
            .set_json(WebhookRequest {
                reference: "don_missing".to_owned(),
            });
        if let Some(token) = token {
            request = request.insert_header((WEBHOOK_TOKEN_HEADER, token));
        }
        let response = actix_test::call_service(&app, request.to_request()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn closed_campaigns_refuse_contributions() {
        let backend = TestBackend::new();
        backend.seed_user("root@alumni.example", Role::Admin).await;
        let app = actix_test::init_service(test_app(backend.state.clone())).await;
        let admin = login(&app, "root@alumni.example").await;
        let created = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/donations")
                .cookie(admin.clone())
                .set_json(library_wing())
                .to_request(),
        )
        .await;
        let id = json_body(created).await["id"].as_str().expect("id").to_owned();

        let closed = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/donations/{id}/close"))
                .cookie(admin)
                .to_request(),
        )
        .await;
        assert_eq!(json_body(closed).await["status"], "closed");

        let anonymous_gift = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/donations/{id}/contribute"))
                .set_json(ContributionRequest { amount: 100 })
                .to_request(),
        )
        .await;
        assert_eq!(anonymous_gift.status(), StatusCode::CONFLICT);
    }

    #[rstest]
    #[case(0, "EUR", "targetAmount")]
    #[case(1000, "euro", "currency")]
    #[actix_web::test]
    async fn invalid_campaigns_name_the_field(
        #[case] target_amount: i64,
        #[case] currency: &str,
        #[case] field: &str,
    ) {
        let backend = TestBackend::new();
        backend.seed_user("root@alumni.example", Role::Admin).await;
        let app = actix_test::init_service(test_app(backend.state.clone())).await;
        let admin = login(&app, "root@alumni.example").await;
        let mut body = library_wing();
        body.target_amount = target_amount;
        body.currency = currency.to_owned();

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/donations")
                .cookie(admin)
                .set_json(body)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["details"]["field"], field);
    }

    #[actix_web::test]
    async fn alumni_cannot_create_campaigns() {
        let backend = TestBackend::new();
        backend.seed_user("ada@example.org", Role::Alumni).await;
        let app = actix_test::init_service(test_app(backend.state.clone())).await;
        let ada = login(&app, "ada@example.org").await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/donations")
                .cookie(ada)
                .set_json(library_wing())
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
