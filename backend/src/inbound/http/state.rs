//! Shared HTTP adapter state.
//!
//! Handlers receive this through `actix_web::web::Data` and only see the
//! [`GuestPortal`] driving port, so they stay testable without a backend.

use std::sync::Arc;

use crate::domain::ports::GuestPortal;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub portal: Arc<dyn GuestPortal>,
}

impl HttpState {
    /// Construct state around a portal implementation.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use wedding_rsvp::domain::{GuestPortalService, InvitationCode};
    /// use wedding_rsvp::inbound::http::state::HttpState;
    /// use wedding_rsvp::outbound::memory::InMemoryBackend;
    ///
    /// let backend = Arc::new(InMemoryBackend::new());
    /// let portal = GuestPortalService::new(
    ///     backend.clone(),
    ///     backend,
    ///     InvitationCode::new("2026"),
    ///     Arc::new(DefaultClock),
    /// );
    /// let state = HttpState::new(Arc::new(portal));
    /// let _portal = state.portal.clone();
    /// ```
    pub fn new(portal: Arc<dyn GuestPortal>) -> Self {
        Self { portal }
    }
}
