//! Driving port for the portal use-cases.
//!
//! Inbound adapters load the caller's [`PortalState`], call one method and
//! persist the returned state. An `Err` means the action failed and the
//! caller keeps its previous state.

use async_trait::async_trait;

use crate::domain::{
    Error, LoginCredentials, Notice, PasswordChange, PortalState, PortalView, Registration,
    RsvpUpdate,
};

/// Successor state plus the message to show for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: PortalState,
    pub notice: Option<Notice>,
}

impl Transition {
    pub fn new(state: PortalState, notice: Notice) -> Self {
        Self {
            state,
            notice: Some(notice),
        }
    }

    /// Transition that shows no message.
    pub fn silent(state: PortalState) -> Self {
        Self {
            state,
            notice: None,
        }
    }
}

/// Outcome of loading the portal page: the possibly renewed state and its
/// view.
#[derive(Debug, Clone, PartialEq)]
pub struct Resumed {
    pub transition: Transition,
    pub view: PortalView,
}

/// Portal use-cases exposed to inbound adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GuestPortal: Send + Sync {
    /// Render the view for `state`; never fails.
    async fn view(&self, state: &PortalState) -> PortalView;

    /// Load the page for a returning client. An expiring session is renewed
    /// and a session the backend no longer accepts ends; never fails.
    async fn resume(&self, state: &PortalState) -> Resumed;

    /// Password sign-in.
    async fn sign_in(
        &self,
        state: &PortalState,
        credentials: LoginCredentials,
    ) -> Result<Transition, Error>;

    /// Self-registration gated by the invitation code.
    async fn register(
        &self,
        state: &PortalState,
        registration: Registration,
        invitation_code: String,
    ) -> Result<Transition, Error>;

    /// Send a one-time code to `email`.
    async fn request_code(&self, state: &PortalState, email: String)
    -> Result<Transition, Error>;

    /// Verify the one-time code for the pending email.
    async fn verify_code(&self, state: &PortalState, code: String) -> Result<Transition, Error>;

    /// Leave the recovery flow ("different email").
    async fn cancel_recovery(&self, state: &PortalState) -> Result<Transition, Error>;

    /// Save the RSVP answer for the signed-in guest.
    async fn update_rsvp(
        &self,
        state: &PortalState,
        update: RsvpUpdate,
    ) -> Result<Transition, Error>;

    /// Change the signed-in guest's password.
    async fn change_password(
        &self,
        state: &PortalState,
        change: PasswordChange,
    ) -> Result<Transition, Error>;

    /// Sign out and clear the local session.
    async fn sign_out(&self, state: &PortalState) -> Result<Transition, Error>;
}
