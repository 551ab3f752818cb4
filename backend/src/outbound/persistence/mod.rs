//! PostgreSQL persistence adapters built on Diesel, `diesel-async`, and bb8.
//!
//! Row structs and table definitions stay private to this module; every
//! repository converts rows to domain types and maps database failures to
//! its port's error type.

mod diesel_campaign_repository;
mod diesel_community_post_repository;
mod diesel_community_repository;
mod diesel_content_repository;
mod diesel_profile_repository;
mod diesel_transaction_repository;
mod diesel_user_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_campaign_repository::DieselCampaignRepository;
pub use diesel_community_post_repository::DieselCommunityPostRepository;
pub use diesel_community_repository::DieselCommunityRepository;
pub use diesel_content_repository::DieselContentRepository;
pub use diesel_profile_repository::DieselProfileRepository;
pub use diesel_transaction_repository::DieselTransactionRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
