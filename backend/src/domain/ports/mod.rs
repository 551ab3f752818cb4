//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod campaign_repository;
mod community_post_repository;
mod community_repository;
mod content_repository;
mod login_service;
mod password_hasher;
mod payment_gateway;
mod profile_repository;
mod transaction_repository;
mod user_repository;
mod verification_notifier;

#[cfg(test)]
pub use campaign_repository::MockCampaignRepository;
pub use campaign_repository::{CampaignRepository, CampaignRepositoryError};
#[cfg(test)]
pub use community_post_repository::MockCommunityPostRepository;
pub use community_post_repository::{CommunityPostRepository, CommunityPostRepositoryError};
#[cfg(test)]
pub use community_repository::MockCommunityRepository;
pub use community_repository::{
    CommunityListQuery, CommunityRepository, CommunityRepositoryError,
};
pub use content_repository::{
    ContentListQuery, ContentRecord, ContentRepository, ContentRepositoryError,
};
pub use login_service::LoginService;
#[cfg(test)]
pub use login_service::MockLoginService;
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use payment_gateway::MockPaymentGateway;
pub use payment_gateway::{
    CheckoutRequest, CheckoutSession, GatewayPaymentStatus, PaymentGateway, PaymentGatewayError,
};
#[cfg(test)]
pub use profile_repository::MockProfileRepository;
pub use profile_repository::{ProfileRepository, ProfileRepositoryError, ProfileSearch};
#[cfg(test)]
pub use transaction_repository::MockTransactionRepository;
pub use transaction_repository::{TransactionRepository, TransactionRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
#[cfg(test)]
pub use verification_notifier::MockVerificationNotifier;
pub use verification_notifier::{VerificationNotifier, VerificationNotifierError};
