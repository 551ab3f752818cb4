//! Request middleware.
//!
//! [`Trace`] wraps the whole application so every response, including the
//! health checks, carries a `trace-id` header.

pub mod trace;

pub use trace::Trace;
