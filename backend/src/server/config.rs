//! HTTP server configuration object.

use std::net::SocketAddr;

use actix_web::cookie::{Key, SameSite};
use wedding_rsvp::domain::InvitationCode;
use wedding_rsvp::settings::BackendSettings;

/// Everything the server needs once settings have been validated.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) invitation_code: InvitationCode,
    pub(crate) backend: Option<BackendSettings>,
}

impl ServerConfig {
    /// Configuration using the in-memory backend.
    #[must_use]
    pub fn new(
        key: Key,
        cookie_secure: bool,
        same_site: SameSite,
        bind_addr: SocketAddr,
        invitation_code: InvitationCode,
    ) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            invitation_code,
            backend: None,
        }
    }

    /// Use the hosted backend when `backend` is present.
    #[must_use]
    pub fn with_backend(mut self, backend: Option<BackendSettings>) -> Self {
        self.backend = backend;
        self
    }
}
