//! Outbound adapters implementing the domain ports.
//!
//! - **persistence**: PostgreSQL repositories on Diesel and `diesel-async`
//! - **memory**: in-process repositories used without a database
//! - **cache**: TTL cache and the cached community repository
//! - **payments**: payment gateway clients
//! - **security**: password hashing
//! - **notifications**: verification token delivery
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business rules.

pub mod cache;
pub mod memory;
pub mod notifications;
pub mod payments;
pub mod persistence;
pub mod security;
