//! Payment gateway adapters.
//!
//! [`HttpPaymentGateway`] speaks the gateway's JSON contract over reqwest;
//! [`FixturePaymentGateway`] answers locally when no gateway URL is set.

mod dto;
mod fixture;
mod http_gateway;

pub use fixture::FixturePaymentGateway;
pub use http_gateway::HttpPaymentGateway;
