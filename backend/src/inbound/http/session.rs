//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! The portal state lives in the client's encrypted session cookie. Handlers
//! load it through [`SessionContext`], hand it to the portal service and
//! persist whatever state comes back.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, PortalState};

pub(crate) const PORTAL_STATE_KEY: &str = "portal_state";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Current portal state; a missing or unreadable cookie value is
    /// treated as anonymous.
    pub fn state(&self) -> PortalState {
        match self.0.get::<PortalState>(PORTAL_STATE_KEY) {
            Ok(state) => state.unwrap_or_default(),
            Err(error) => {
                warn!(%error, "discarding unreadable portal state in session cookie");
                PortalState::Anonymous
            }
        }
    }

    /// Store `state`; returning to anonymous deletes the session cookie.
    pub fn persist(&self, state: &PortalState) -> Result<(), Error> {
        if matches!(state, PortalState::Anonymous) {
            self.0.purge();
            return Ok(());
        }
        self.0
            .insert(PORTAL_STATE_KEY, state)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
