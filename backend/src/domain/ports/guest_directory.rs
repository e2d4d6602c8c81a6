//! Driven port for the guest profile table.
//!
//! Both operations are keyed by the session, never by a caller-supplied id:
//! adapters read and write only the row whose id equals the session's
//! identity id.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{AuthSession, GuestProfile, RsvpUpdate};

define_port_error! {
    /// Errors surfaced by guest directory adapters.
    pub enum GuestDirectoryError {
        /// Access token was rejected.
        Unauthorized { message: String } => "guest directory unauthorised: {message}",
        /// Backend refused the request.
        Rejected { message: String } => "guest directory rejected request: {message}",
        /// Network transport failed before a response arrived.
        Transport { message: String } => "guest directory unreachable: {message}",
        /// Call exceeded the configured timeout.
        Timeout { message: String } => "guest directory timed out: {message}",
        /// Row could not be decoded.
        Decode { message: String } => "guest directory response invalid: {message}",
    }
}

/// Port for reading and answering the guest's own RSVP row.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GuestDirectory: Send + Sync {
    /// Load the session owner's profile row; `None` when it does not exist.
    async fn fetch_own_profile(
        &self,
        session: &AuthSession,
    ) -> Result<Option<GuestProfile>, GuestDirectoryError>;

    /// Write the RSVP answer to the session owner's row.
    async fn update_own_profile(
        &self,
        session: &AuthSession,
        update: &RsvpUpdate,
    ) -> Result<(), GuestDirectoryError>;
}
