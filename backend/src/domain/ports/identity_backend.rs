//! Driven port for the external identity service.
//!
//! Covers account creation, password and one-time-code sign-in, session
//! refresh, password change and sign-out. Adapters translate transport
//! details into [`IdentityBackendError`] so the portal service can render a
//! uniform failure notice.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{
    AuthSession, Email, LoginCredentials, OneTimeCode, PasswordChange, RefreshToken, Registration,
};

/// Result of a sign-up call the backend accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// A new account exists; the guest signs in separately.
    Created,
    /// The backend answered with a user but no linked identity: the address
    /// is already registered or still awaits email confirmation.
    AlreadyRegistered,
}

define_port_error! {
    /// Errors surfaced by identity backend adapters.
    pub enum IdentityBackendError {
        /// Email/password pair was rejected.
        InvalidCredentials { message: String } => "invalid credentials: {message}",
        /// One-time code was wrong or expired.
        InvalidCode { message: String } => "invalid code: {message}",
        /// Access token was missing, expired or revoked.
        Unauthorized { message: String } => "unauthorised: {message}",
        /// Backend throttled the caller.
        RateLimited { message: String } => "rate limited: {message}",
        /// Backend refused the request for another reason.
        Rejected { message: String } => "request rejected: {message}",
        /// Network transport failed before a response arrived.
        Transport { message: String } => "identity backend unreachable: {message}",
        /// Call exceeded the configured timeout.
        Timeout { message: String } => "identity backend timed out: {message}",
        /// Response body could not be decoded.
        Decode { message: String } => "identity backend response invalid: {message}",
    }
}

/// Port for the identity half of the backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    /// Register a new account with `display_name` as account metadata.
    async fn create_account(
        &self,
        registration: &Registration,
    ) -> Result<SignUpOutcome, IdentityBackendError>;

    /// Exchange an email/password pair for a session.
    async fn sign_in(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<AuthSession, IdentityBackendError>;

    /// Ask the backend to email a one-time code to an existing account.
    async fn request_one_time_code(&self, email: &Email) -> Result<(), IdentityBackendError>;

    /// Exchange a one-time code for a session.
    async fn verify_one_time_code(
        &self,
        email: &Email,
        code: &OneTimeCode,
    ) -> Result<AuthSession, IdentityBackendError>;

    /// Exchange a refresh token for a new session; the old refresh token
    /// is consumed.
    async fn refresh_session(
        &self,
        refresh_token: &RefreshToken,
    ) -> Result<AuthSession, IdentityBackendError>;

    /// Replace the password of the session's account.
    async fn change_password(
        &self,
        session: &AuthSession,
        change: &PasswordChange,
    ) -> Result<(), IdentityBackendError>;

    /// Revoke the session's token.
    async fn sign_out(&self, session: &AuthSession) -> Result<(), IdentityBackendError>;
}
