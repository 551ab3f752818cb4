//! Backend library modules for the alumni portal.
//!
//! The crate follows a hexagonal layout: [`domain`] holds entities and
//! services, [`inbound`] adapts HTTP requests onto them, and [`outbound`]
//! implements the ports against PostgreSQL, the payment gateway, and
//! in-process stores.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(test)]
pub(crate) mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
