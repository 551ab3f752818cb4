//! Builders for HTTP state from repository-backed services.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use backend::domain::ports::{
    CampaignRepository, CommunityPostRepository, CommunityRepository, ContentRepository,
    PasswordHasher, PaymentGateway, ProfileRepository, TransactionRepository, UserRepository,
    VerificationNotifier,
};
use backend::domain::{
    AuthService, CommunityService, DonationService, Event, EventService, Opportunity,
    OpportunityService, ProfileService, Story, StoryService,
};
use backend::inbound::http::state::{ContentServices, HttpState};
use backend::outbound::cache::CachedCommunityRepository;
use backend::outbound::memory::{
    InMemoryCommunityPostRepository, InMemoryCommunityRepository, InMemoryContentRepository,
    InMemoryDonationStore, InMemoryProfileRepository, InMemoryUserRepository,
};
use backend::outbound::notifications::{
    HttpVerificationNotifier, MailRelayConfig, TracingVerificationNotifier,
};
use backend::outbound::payments::{FixturePaymentGateway, HttpPaymentGateway};
use backend::outbound::persistence::{
    DbPool, DieselCampaignRepository, DieselCommunityPostRepository, DieselCommunityRepository,
    DieselContentRepository, DieselProfileRepository, DieselTransactionRepository,
    DieselUserRepository,
};
use backend::outbound::security::BcryptPasswordHasher;

use super::ServerConfig;
use super::config::AdapterSettings;

/// Port implementations selected for one server instance.
struct Repositories {
    users: Arc<dyn UserRepository>,
    profiles: Arc<dyn ProfileRepository>,
    communities: Arc<dyn CommunityRepository>,
    posts: Arc<dyn CommunityPostRepository>,
    campaigns: Arc<dyn CampaignRepository>,
    transactions: Arc<dyn TransactionRepository>,
    events: Arc<dyn ContentRepository<Event>>,
    opportunities: Arc<dyn ContentRepository<Opportunity>>,
    stories: Arc<dyn ContentRepository<Story>>,
}

impl Repositories {
    fn diesel(pool: &DbPool) -> Self {
        Self {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            profiles: Arc::new(DieselProfileRepository::new(pool.clone())),
            communities: Arc::new(DieselCommunityRepository::new(pool.clone())),
            posts: Arc::new(DieselCommunityPostRepository::new(pool.clone())),
            campaigns: Arc::new(DieselCampaignRepository::new(pool.clone())),
            transactions: Arc::new(DieselTransactionRepository::new(pool.clone())),
            events: Arc::new(DieselContentRepository::<Event>::new(pool.clone())),
            opportunities: Arc::new(DieselContentRepository::<Opportunity>::new(pool.clone())),
            stories: Arc::new(DieselContentRepository::<Story>::new(pool.clone())),
        }
    }

    fn in_memory() -> Self {
        let donations = InMemoryDonationStore::new();
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            profiles: Arc::new(InMemoryProfileRepository::new()),
            communities: Arc::new(InMemoryCommunityRepository::new()),
            posts: Arc::new(InMemoryCommunityPostRepository::new()),
            campaigns: Arc::new(donations.campaigns()),
            transactions: Arc::new(donations.transactions()),
            events: Arc::new(InMemoryContentRepository::<Event>::new()),
            opportunities: Arc::new(InMemoryContentRepository::<Opportunity>::new()),
            stories: Arc::new(InMemoryContentRepository::<Story>::new()),
        }
    }
}

fn build_payment_gateway(adapters: &AdapterSettings) -> std::io::Result<Arc<dyn PaymentGateway>> {
    match &adapters.payment_gateway {
        Some(base) => {
            let gateway = HttpPaymentGateway::new(base.clone(), adapters.payment_timeout)
                .map_err(|e| std::io::Error::other(format!("payment gateway client: {e}")))?;
            info!(gateway = %base, "using HTTP payment gateway");
            Ok(Arc::new(gateway))
        }
        None => {
            warn!("no payment gateway configured; payments use the in-process fixture");
            Ok(Arc::new(FixturePaymentGateway::new()))
        }
    }
}

/// Delivery channel for verification tokens.
enum VerificationDelivery<'a> {
    Relay(&'a MailRelayConfig),
    Log { reveal_token: bool },
}

fn verification_delivery(adapters: &AdapterSettings) -> VerificationDelivery<'_> {
    match &adapters.mail_relay {
        Some(relay) => VerificationDelivery::Relay(relay),
        None => VerificationDelivery::Log {
            reveal_token: adapters.reveal_verification_tokens,
        },
    }
}

fn build_verification_notifier(
    adapters: &AdapterSettings,
) -> std::io::Result<Arc<dyn VerificationNotifier>> {
    match verification_delivery(adapters) {
        VerificationDelivery::Relay(relay) => {
            let notifier = HttpVerificationNotifier::new(relay.clone())
                .map_err(|e| std::io::Error::other(format!("mail relay client: {e}")))?;
            info!(relay = %relay.base, "sending verification mail through HTTP relay");
            Ok(Arc::new(notifier))
        }
        VerificationDelivery::Log { reveal_token } => {
            warn!("no mail relay configured; verification tokens are only logged");
            Ok(Arc::new(if reveal_token {
                TracingVerificationNotifier::revealing()
            } else {
                TracingVerificationNotifier::default()
            }))
        }
    }
}

/// Wire every domain service over the adapters selected by `config`.
///
/// A configured database pool selects the Diesel repositories; otherwise
/// all state lives in memory for the lifetime of the process. Community
/// reads go through a TTL cache in both cases.
///
/// # Errors
/// Returns [`std::io::Error`] when the payment gateway or mail relay client
/// cannot be built.
pub(super) fn build_http_state(config: &ServerConfig) -> std::io::Result<web::Data<HttpState>> {
    let adapters = &config.adapters;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let repositories = match &config.db_pool {
        Some(pool) => Repositories::diesel(pool),
        None => {
            warn!("no database configured; state is held in memory");
            Repositories::in_memory()
        }
    };
    let Repositories {
        users,
        profiles,
        communities,
        posts,
        campaigns,
        transactions,
        events,
        opportunities,
        stories,
    } = repositories;

    let cached_communities: Arc<dyn CommunityRepository> = Arc::new(
        CachedCommunityRepository::new(communities, adapters.cache_ttl, clock.clone()),
    );
    let hasher: Arc<dyn PasswordHasher> =
        Arc::new(BcryptPasswordHasher::new(adapters.password_hash_cost));

    let auth = AuthService::new(
        users.clone(),
        hasher,
        build_verification_notifier(adapters)?,
        clock.clone(),
        adapters.auth.clone(),
    );
    let community_service = CommunityService::new(cached_communities, posts, clock.clone());
    let profile_service =
        ProfileService::new(profiles, users, community_service.clone(), clock.clone());
    let donations = DonationService::new(
        campaigns,
        transactions,
        build_payment_gateway(adapters)?,
        clock.clone(),
        adapters.webhook_secret.clone(),
    );
    let content = ContentServices {
        events: EventService::new(events, clock.clone()),
        opportunities: OpportunityService::new(opportunities, clock.clone()),
        stories: StoryService::new(stories, clock),
    };

    Ok(web::Data::new(HttpState::new(
        auth,
        profile_service,
        community_service,
        donations,
        content,
    )))
}
