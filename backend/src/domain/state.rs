//! Per-client portal state machine.
//!
//! ```text
//! Anonymous ──sign in / verify code──────────────▶ Authenticated
//! Anonymous ──send code──▶ RecoveryRequested(email) ──verify──▶ Authenticated
//! RecoveryRequested ──different email──▶ Anonymous
//! Authenticated ──sign out / session expired──▶ Anonymous
//! ```
//!
//! The state is a plain value owned by one client's session. Transition
//! methods consume it and return the successor; guards return a domain
//! [`Error`] without touching the state so a failed action leaves it intact.

use serde::{Deserialize, Serialize};

use super::auth::AuthSession;
use super::error::Error;
use super::user::Email;

/// Where a client currently is in the authentication flow.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum PortalState {
    /// No identity and no pending one-time code.
    #[default]
    Anonymous,
    /// A one-time code was sent to `email`; waiting for the guest to enter it.
    RecoveryRequested { email: Email },
    /// A verified identity with its access token.
    Authenticated { session: AuthSession },
}

impl PortalState {
    /// Whether the authenticated view tree applies.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// Session of the authenticated guest, if any.
    pub fn auth_session(&self) -> Option<&AuthSession> {
        match self {
            Self::Authenticated { session } => Some(session),
            _ => None,
        }
    }

    /// Email a one-time code was requested for, if any.
    pub fn recovery_email(&self) -> Option<&Email> {
        match self {
            Self::RecoveryRequested { email } => Some(email),
            _ => None,
        }
    }

    /// Guard for actions of the authenticated view tree.
    ///
    /// # Errors
    /// [`Error::unauthorized`] when no identity is present.
    pub fn require_session(&self) -> Result<&AuthSession, Error> {
        self.auth_session()
            .ok_or_else(|| Error::unauthorized("sign in first"))
    }

    /// Guard for sign-in and registration, available from both anonymous
    /// states.
    ///
    /// # Errors
    /// [`Error::conflict`] when a guest is already signed in.
    pub fn require_unauthenticated(&self) -> Result<(), Error> {
        if self.is_authenticated() {
            return Err(Error::conflict("already signed in"));
        }
        Ok(())
    }

    /// Guard for requesting a one-time code.
    ///
    /// # Errors
    /// [`Error::conflict`] when signed in, or when a code is already pending
    /// (the guest must pick "different email" first).
    pub fn require_anonymous(&self) -> Result<(), Error> {
        match self {
            Self::Anonymous => Ok(()),
            Self::RecoveryRequested { .. } => Err(Error::conflict(
                "a code was already sent; choose a different email first",
            )),
            Self::Authenticated { .. } => Err(Error::conflict("already signed in")),
        }
    }

    /// Guard for verifying a one-time code.
    ///
    /// # Errors
    /// [`Error::conflict`] when no code is pending.
    pub fn require_recovery(&self) -> Result<&Email, Error> {
        self.recovery_email()
            .ok_or_else(|| Error::conflict("request a code first"))
    }

    /// Successful password sign-in or code verification.
    pub fn signed_in(self, session: AuthSession) -> Self {
        Self::Authenticated { session }
    }

    /// Successful "send code" call.
    pub fn recovery_requested(self, email: Email) -> Self {
        Self::RecoveryRequested { email }
    }

    /// "Different email": drop any pending code. Leaves an authenticated
    /// state untouched.
    pub fn recovery_cancelled(self) -> Self {
        match self {
            Self::RecoveryRequested { .. } => Self::Anonymous,
            other => other,
        }
    }

    /// Explicit sign-out.
    pub fn signed_out(self) -> Self {
        Self::Anonymous
    }

    /// Swap in tokens renewed by the backend. Only an authenticated state
    /// changes.
    pub fn session_renewed(self, session: AuthSession) -> Self {
        match self {
            Self::Authenticated { .. } => Self::Authenticated { session },
            other => other,
        }
    }

    /// The backend no longer accepts the session and it cannot be renewed.
    pub fn session_expired(self) -> Self {
        Self::Anonymous
    }
}
