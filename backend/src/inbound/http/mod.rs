//! HTTP inbound adapter exposing REST endpoints.
//!
//! Every handler is registered by [`configure_api`] relative to the
//! `/api/v1` scope; health checks are mounted at the application root.

use actix_web::web;

pub mod auth;
pub mod communities;
pub mod content;
pub mod donations;
pub mod error;
pub mod health;
pub mod profiles;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;

/// Register every `/api/v1` handler on `cfg`, along with the extractor
/// settings from [`error::extractor_config`].
///
/// Literal segments such as `/communities/mine` are registered before the
/// `{id}` patterns they would otherwise match.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.configure(error::extractor_config)
        .service(auth::register)
        .service(auth::login)
        .service(auth::logout)
        .service(auth::verify_email)
        .service(auth::current_user)
        .service(profiles::create_profile)
        .service(profiles::get_own_profile)
        .service(profiles::update_profile)
        .service(profiles::delete_profile)
        .service(profiles::profile_completion)
        .service(profiles::list_profiles)
        .service(profiles::get_profile)
        .service(communities::list_communities)
        .service(communities::create_community)
        .service(communities::my_communities)
        .service(communities::get_community)
        .service(communities::update_community)
        .service(communities::delete_community)
        .service(communities::join_community)
        .service(communities::leave_community)
        .service(communities::list_posts)
        .service(communities::create_post)
        .service(communities::delete_post)
        .service(donations::list_campaigns)
        .service(donations::create_campaign)
        .service(donations::get_campaign)
        .service(donations::update_campaign)
        .service(donations::close_campaign)
        .service(donations::delete_campaign)
        .service(donations::contribute)
        .service(donations::my_transactions)
        .service(donations::get_transaction)
        .service(donations::payment_webhook)
        .service(content::list_events)
        .service(content::create_event)
        .service(content::get_event)
        .service(content::update_event)
        .service(content::delete_event)
        .service(content::list_opportunities)
        .service(content::create_opportunity)
        .service(content::get_opportunity)
        .service(content::update_opportunity)
        .service(content::delete_opportunity)
        .service(content::list_stories)
        .service(content::create_story)
        .service(content::get_story)
        .service(content::update_story)
        .service(content::delete_story);
}
