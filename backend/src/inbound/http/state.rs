//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and ports, and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::LoginService;
use crate::domain::{
    Actor, AuthService, CommunityService, DonationService, Error, ErrorCode, EventService,
    OpportunityService, ProfileService, StoryService, Viewer,
};

use super::session::SessionContext;

/// Parameter object bundling the authored-content services.
#[derive(Clone)]
pub struct ContentServices {
    pub events: EventService,
    pub opportunities: OpportunityService,
    pub stories: StoryService,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub auth: AuthService,
    pub profiles: ProfileService,
    pub communities: CommunityService,
    pub donations: DonationService,
    pub content: ContentServices,
}

impl HttpState {
    /// Bundle the services. Login goes through `auth` unless replaced with
    /// [`HttpState::with_login`].
    pub fn new(
        auth: AuthService,
        profiles: ProfileService,
        communities: CommunityService,
        donations: DonationService,
        content: ContentServices,
    ) -> Self {
        Self {
            login: Arc::new(auth.clone()),
            auth,
            profiles,
            communities,
            donations,
            content,
        }
    }

    /// Swap the login port, e.g. for a test double.
    #[must_use]
    pub fn with_login(mut self, login: Arc<dyn LoginService>) -> Self {
        self.login = login;
        self
    }

    /// Identity of the signed-in caller, or `401` without a session.
    pub async fn require_actor(&self, session: &SessionContext) -> Result<Actor, Error> {
        let id = session.require_user_id()?;
        Ok(self.auth.current_user(&id).await?.actor())
    }

    /// Identity of the caller. Requests without a usable session are
    /// anonymous.
    pub async fn viewer(&self, session: &SessionContext) -> Result<Viewer, Error> {
        let Some(id) = session.user_id()? else {
            return Ok(Viewer::Anonymous);
        };
        match self.auth.current_user(&id).await {
            Ok(user) => Ok(Viewer::from(user.actor())),
            Err(error) if error.code() == ErrorCode::Unauthorized => Ok(Viewer::Anonymous),
            Err(error) => Err(error),
        }
    }
}
