//! Port for delivering email verification tokens.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::Email;

use super::define_port_error;

define_port_error! {
    /// Failures raised by verification notifiers.
    pub enum VerificationNotifierError {
        /// The message could not be handed to the delivery channel.
        Delivery { message: String } => "verification delivery failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VerificationNotifier: Send + Sync {
    /// Send `token` to `email`; the token stops working at `expires_at`.
    async fn send_verification(
        &self,
        email: &Email,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), VerificationNotifierError>;
}
