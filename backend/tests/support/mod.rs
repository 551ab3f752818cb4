//! Shared wiring for HTTP integration tests.
//!
//! Builds the application over in-memory adapters, the fixture payment
//! gateway, and a notifier that records verification tokens.

use std::sync::{Arc, Mutex};

use actix_http::Request;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test as actix_test, web};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mockable::DefaultClock;
use serde_json::Value;

use backend::Trace;
use backend::domain::ports::{VerificationNotifier, VerificationNotifierError};
use backend::domain::{
    AuthService, AuthSettings, CommunityService, DonationService, Email, Event, EventService,
    Opportunity, OpportunityService, ProfileService, Story, StoryService, WebhookSecret,
};
use backend::inbound::http::configure_api;
use backend::inbound::http::state::{ContentServices, HttpState};
use backend::outbound::cache::CachedCommunityRepository;
use backend::outbound::memory::{
    InMemoryCommunityPostRepository, InMemoryCommunityRepository, InMemoryContentRepository,
    InMemoryDonationStore, InMemoryProfileRepository, InMemoryUserRepository,
};
use backend::outbound::payments::FixturePaymentGateway;
use backend::outbound::security::BcryptPasswordHasher;

pub const ADMIN_EMAIL: &str = "dean@alumni.example";
pub const PASSWORD: &str = "correct horse battery";
pub const WEBHOOK_TOKEN: &str = "integration-webhook-secret";

/// Notifier keeping every token it was asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
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

/// Application state plus the handles tests drive directly.
pub struct Portal {
    pub state: HttpState,
    pub gateway: Arc<FixturePaymentGateway>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Portal {
    pub fn new() -> Self {
        let clock = Arc::new(DefaultClock);
        let users = Arc::new(InMemoryUserRepository::new());
        let gateway = Arc::new(FixturePaymentGateway::new());
        let notifier = Arc::new(RecordingNotifier::default());

        let auth = AuthService::new(
            users.clone(),
            Arc::new(BcryptPasswordHasher::new(4)),
            notifier.clone(),
            clock.clone(),
            AuthSettings {
                verification_ttl: Duration::hours(24),
                admin_emails: vec![Email::new(ADMIN_EMAIL).expect("admin email")],
            },
        );
        let communities = CommunityService::new(
            Arc::new(CachedCommunityRepository::new(
                Arc::new(InMemoryCommunityRepository::new()),
                Duration::seconds(60),
                clock.clone(),
            )),
            Arc::new(InMemoryCommunityPostRepository::new()),
            clock.clone(),
        );
        let profiles = ProfileService::new(
            Arc::new(InMemoryProfileRepository::new()),
            users,
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
                clock,
            ),
        };

        Self {
            state: HttpState::new(auth, profiles, communities, donations, content),
            gateway,
            notifier,
        }
    }

    /// Application wired the way the server wires it, minus Swagger.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        let session = SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
            .cookie_name("session".to_owned())
            .cookie_secure(false)
            .build();
        App::new()
            .app_data(web::Data::new(self.state.clone()))
            .wrap(Trace)
            .service(web::scope("/api/v1").wrap(session).configure(configure_api))
    }
}

/// Decode a JSON response body.
pub async fn json_body<B: MessageBody>(response: ServiceResponse<B>) -> Value {
    let body = actix_test::read_body(response).await;
    serde_json::from_slice(&body).expect("json body")
}

/// Register, verify, and log in; returns the session cookie.
pub async fn sign_up<S, B>(app: &S, portal: &Portal, email: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let credentials = serde_json::json!({ "email": email, "password": PASSWORD });
    let registered = actix_test::call_service(
        app,
        actix_test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(&credentials)
            .to_request(),
    )
    .await;
    assert_eq!(registered.status().as_u16(), 201, "register {email}");

    let token = portal.notifier.token_for(email).expect("verification token");
    let verified = actix_test::call_service(
        app,
        actix_test::TestRequest::post()
            .uri("/api/v1/auth/verify")
            .set_json(serde_json::json!({ "token": token }))
            .to_request(),
    )
    .await;
    assert_eq!(verified.status().as_u16(), 200, "verify {email}");

    let logged_in = actix_test::call_service(
        app,
        actix_test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(&credentials)
            .to_request(),
    )
    .await;
    assert_eq!(logged_in.status().as_u16(), 200, "login {email}");
    logged_in
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie")
}
