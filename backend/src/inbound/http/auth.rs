//! Account HTTP handlers.
//!
//! ```text
//! POST /api/v1/auth/register {"email":"ada@example.org","password":"..."}
//! POST /api/v1/auth/login {"email":"ada@example.org","password":"..."}
//! POST /api/v1/auth/logout
//! POST /api/v1/auth/verify {"token":"..."}
//! GET /api/v1/auth/me
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{
    Error, LoginCredentials, LoginValidationError, Registration, RegistrationValidationError,
    Role, User, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Credentials for `register` and `login`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/verify`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub token: String,
}

/// Account as returned to its owner. Never carries the password hash or
/// the verification token.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(value_type = String, format = Uuid)]
    pub id: UserId,
    pub email: String,
    #[schema(value_type = String, example = "alumni")]
    pub role: Role,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email.as_ref().to_owned(),
            role: user.role,
            verified: user.verified,
            created_at: user.created_at,
        }
    }
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::EmptyEmail => Error::invalid_request("email must not be empty")
            .with_details(json!({ "field": "email", "code": "empty_email" })),
        LoginValidationError::EmptyPassword => Error::invalid_request("password must not be empty")
            .with_details(json!({ "field": "password", "code": "empty_password" })),
    }
}

fn map_registration_error(err: RegistrationValidationError) -> Error {
    let code = match err {
        RegistrationValidationError::Email(_) => "invalid_email",
        RegistrationValidationError::PasswordTooShort { .. } => "password_too_short",
        RegistrationValidationError::PasswordTooLong { .. } => "password_too_long",
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": err.field(), "code": code }))
}

/// Create an unverified account and send its verification token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<CredentialsRequest>,
) -> ApiResult<HttpResponse> {
    let registration = Registration::try_from_parts(&payload.email, &payload.password)
        .map_err(map_registration_error)?;
    let user = state.auth.register(registration).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Authenticate and establish a session.
///
/// Unknown emails and wrong passwords share one `401` response.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Login success", body = UserResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CredentialsRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let credentials = LoginCredentials::try_from_parts(&payload.email, &payload.password)
        .map_err(map_login_validation_error)?;
    let user = state.login.authenticate(&credentials).await?;
    session.persist_user(&user.id)?;
    Ok(web::Json(UserResponse::from(user)))
}

/// End the session.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["auth"],
    operation_id = "logout",
    security([])
)]
#[post("/auth/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}

/// Confirm an email address.
#[utoipa::path(
    post,
    path = "/api/v1/auth/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Email verified", body = UserResponse),
        (status = 400, description = "Missing or expired token", body = ErrorSchema),
        (status = 404, description = "Unknown token", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "verifyEmail",
    security([])
)]
#[post("/auth/verify")]
pub async fn verify_email(
    state: web::Data<HttpState>,
    payload: web::Json<VerifyRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let user = state.auth.verify_email(&payload.token).await?;
    Ok(web::Json(UserResponse::from(user)))
}

/// Return the signed-in account.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "currentUser"
)]
#[get("/auth/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UserResponse>> {
    let id = session.require_user_id()?;
    let user = state.auth.current_user(&id).await?;
    Ok(web::Json(UserResponse::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockLoginService;
    use crate::inbound::http::test_utils::{TestBackend, session_cookie, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::Value;
    use std::sync::Arc;

    fn credentials(email: &str, password: &str) -> CredentialsRequest {
        CredentialsRequest {
            email: email.to_owned(),
            password: password.to_owned(),
        }
    }

    async fn json_body(response: actix_web::dev::ServiceResponse) -> Value {
        let body = actix_test::read_body(response).await;
        serde_json::from_slice(&body).expect("json body")
    }

    #[actix_web::test]
    async fn registration_hides_secrets_and_login_opens_a_session() {
        let backend = TestBackend::new();
        let app = actix_test::init_service(test_app(backend.state.clone())).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/register")
                .set_json(credentials("Grace@Example.org", "hopper-1906"))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["email"], "grace@example.org");
        assert_eq!(body["verified"], false);
        assert_eq!(body["role"], "alumni");
        assert!(body.get("passwordHash").is_none());
        assert!(body.get("verification").is_none());

        let logged_in = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .set_json(credentials("grace@example.org", "hopper-1906"))
                .to_request(),
        )
        .await;
        assert_eq!(logged_in.status(), StatusCode::OK);
        let cookie = session_cookie(&logged_in);

        let me = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/auth/me")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(me.status(), StatusCode::OK);
        assert_eq!(json_body(me).await["email"], "grace@example.org");
    }

    #[actix_web::test]
    async fn duplicate_registration_conflicts() {
        let backend = TestBackend::new();
        backend.seed_user("ada@example.org", Role::Alumni).await;
        let app = actix_test::init_service(test_app(backend.state.clone())).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/register")
                .set_json(credentials("ada@example.org", "another-password"))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(response).await["details"]["code"], "email_taken");
    }

    const OVERLONG_PASSWORD: &str =
        "correct horse battery staple correct horse battery staple correct horse b";

    #[rstest]
    #[case("not-an-email", "long-enough", "email", "invalid_email")]
    #[case("ada@example.org", "short", "password", "password_too_short")]
    #[case("ada@example.org", OVERLONG_PASSWORD, "password", "password_too_long")]
    #[actix_web::test]
    async fn invalid_registrations_name_the_field(
        #[case] email: &str,
        #[case] password: &str,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let backend = TestBackend::new();
        let app = actix_test::init_service(test_app(backend.state.clone())).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/register")
                .set_json(credentials(email, password))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["code"], "invalid_request");
        assert_eq!(body["details"]["field"], field);
        assert_eq!(body["details"]["code"], code);
    }

    #[rstest]
    #[case("   ", "password", "email", "empty_email")]
    #[case("ada@example.org", "", "password", "empty_password")]
    #[actix_web::test]
    async fn blank_login_fields_are_rejected(
        #[case] email: &str,
        #[case] password: &str,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let backend = TestBackend::new();
        let app = actix_test::init_service(test_app(backend.state.clone())).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .set_json(credentials(email, password))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["details"]["field"], field);
        assert_eq!(body["details"]["code"], code);
    }

    #[actix_web::test]
    async fn rejected_credentials_do_not_open_a_session() {
        let mut login_service = MockLoginService::new();
        login_service
            .expect_authenticate()
            .times(1)
            .return_once(|_| Err(Error::unauthorized("invalid credentials")));
        let backend = TestBackend::new();
        let state = backend.state.clone().with_login(Arc::new(login_service));
        let app = actix_test::init_service(test_app(state)).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .set_json(credentials("ada@example.org", "wrong-password"))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(
            response
                .response()
                .cookies()
                .all(|cookie| cookie.name() != "session")
        );
    }

    #[actix_web::test]
    async fn verification_token_from_registration_verifies_the_account() {
        let backend = TestBackend::new();
        let app = actix_test::init_service(test_app(backend.state.clone())).await;
        actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/register")
                .set_json(credentials("linus@example.org", "penguins-rule"))
                .to_request(),
        )
        .await;
        let token = backend
            .notifier
            .token_for("linus@example.org")
            .expect("token sent");

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/verify")
                .set_json(VerifyRequest { token })
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["verified"], true);
    }

    #[actix_web::test]
    async fn logout_ends_the_session() {
        let backend = TestBackend::new();
        backend.seed_user("ada@example.org", Role::Alumni).await;
        let app = actix_test::init_service(test_app(backend.state.clone())).await;
        let cookie = crate::inbound::http::test_utils::login(&app, "ada@example.org").await;

        let logged_out = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/auth/logout")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(logged_out.status(), StatusCode::NO_CONTENT);
        let cleared = session_cookie(&logged_out);

        let me = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/auth/me")
                .cookie(cleared)
                .to_request(),
        )
        .await;
        assert_eq!(me.status(), StatusCode::UNAUTHORIZED);
    }
}
