//! Test helpers for inbound HTTP components.

use std::sync::{Arc, Mutex};

use actix_http::Request;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test, web};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use crate::domain::ports::{
    PasswordHasher, UserRepository, VerificationNotifier, VerificationNotifierError,
};
use crate::domain::{
    AuthService, AuthSettings, CommunityService, DonationService, Email, Event, EventService,
    Opportunity, OpportunityService, ProfileService, Role, Story, StoryService, User, UserId,
    WebhookSecret,
};
use crate::inbound::http::configure_api;
use crate::inbound::http::state::{ContentServices, HttpState};
use crate::outbound::memory::{
    InMemoryCommunityPostRepository, InMemoryCommunityRepository, InMemoryContentRepository,
    InMemoryDonationStore, InMemoryProfileRepository, InMemoryUserRepository,
};
use crate::outbound::payments::FixturePaymentGateway;
use crate::outbound::security::BcryptPasswordHasher;
use crate::test_support::MutableClock;

/// Password given to every seeded user.
pub const PASSWORD: &str = "correct horse battery";
/// Webhook token accepted by [`TestBackend`].
pub const WEBHOOK_TOKEN: &str = "gateway-shared-secret";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Application serving every `/api/v1` handler over `state`.
pub fn test_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .wrap(test_session_middleware())
        .service(web::scope("/api/v1").configure(configure_api))
}

/// The `session` cookie set on a response.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie set")
}

/// Verification notifier that keeps the last token per address.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    /// Most recent token sent to `email`.
    pub fn token_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .expect("notifier lock")
            .iter()
            .rev()
            .find(|(address, _)| address == email)
            .map(|(_, token)| token.clone())
    }
}

#[async_trait]
impl VerificationNotifier for RecordingNotifier {
    async fn send_verification(
        &self,
        email: &Email,
        token: &str,
        _expires_at: DateTime<Utc>,
    ) -> Result<(), VerificationNotifierError> {
        self.sent
            .lock()
            .expect("notifier lock")
            .push((email.as_ref().to_owned(), token.to_owned()));
        Ok(())
    }
}

/// HTTP state over in-memory adapters with handles for assertions.
pub struct TestBackend {
    pub state: HttpState,
    pub users: Arc<InMemoryUserRepository>,
    pub gateway: Arc<FixturePaymentGateway>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<MutableClock>,
    hasher: Arc<BcryptPasswordHasher>,
}

impl TestBackend {
    /// Fresh backend with empty stores and the clock at the fixture instant.
    pub fn new() -> Self {
        let users = Arc::new(InMemoryUserRepository::new());
        let gateway = Arc::new(FixturePaymentGateway::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let clock = Arc::new(MutableClock::at_fixture_now());
        let hasher = Arc::new(BcryptPasswordHasher::new(4));

        let auth = AuthService::new(
            users.clone(),
            hasher.clone(),
            notifier.clone(),
            clock.clone(),
            AuthSettings {
                verification_ttl: Duration::hours(24),
                admin_emails: vec![Email::new("root@alumni.example").expect("admin email")],
            },
        );
        let communities = CommunityService::new(
            Arc::new(InMemoryCommunityRepository::new()),
            Arc::new(InMemoryCommunityPostRepository::new()),
            clock.clone(),
        );
        let profiles = ProfileService::new(
            Arc::new(InMemoryProfileRepository::new()),
            users.clone(),
            communities.clone(),
            clock.clone(),
        );
        let store = InMemoryDonationStore::new();
        let donations = DonationService::new(
            Arc::new(store.campaigns()),
            Arc::new(store.transactions()),
            gateway.clone(),
            clock.clone(),
            WebhookSecret::new(WEBHOOK_TOKEN),
        );
        let content = ContentServices {
            events: EventService::new(
                Arc::new(InMemoryContentRepository::<Event>::new()),
                clock.clone(),
            ),
            opportunities: OpportunityService::new(
                Arc::new(InMemoryContentRepository::<Opportunity>::new()),
                clock.clone(),
            ),
            stories: StoryService::new(
                Arc::new(InMemoryContentRepository::<Story>::new()),
                clock.clone(),
            ),
        };

        Self {
            state: HttpState::new(auth, profiles, communities, donations, content),
            users,
            gateway,
            notifier,
            clock,
            hasher,
        }
    }

    /// Store a verified user with [`PASSWORD`] and the given role.
    pub async fn seed_user(&self, email: &str, role: Role) -> User {
        let user = User {
            id: UserId::random(),
            email: Email::new(email).expect("seed email"),
            password_hash: self.hasher.hash(PASSWORD).await.expect("hash"),
            role,
            verified: true,
            verification: None,
            created_at: crate::test_support::fixture_now(),
        };
        self.users.insert(&user).await.expect("seed user");
        user
    }
}

/// Log in through `POST /api/v1/auth/login` and return the session cookie.
pub async fn login<S, B>(app: &S, email: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let request = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "email": email, "password": PASSWORD }))
        .to_request();
    let response = test::call_service(app, request).await;
    assert!(response.status().is_success(), "login failed: {}", response.status());
    session_cookie(&response)
}
