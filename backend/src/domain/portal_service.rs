//! Portal service implementing the [`GuestPortal`] driving port.
//!
//! Each action checks the state guard and local validation first, then calls
//! the backend. Failures leave the caller's state untouched.
//!
//! Calls made for a signed-in guest go through one helper: a token close to
//! expiry is renewed first, and a rejected token is renewed once and the call
//! retried. A session that cannot be renewed ends, and the guest lands back
//! in the anonymous view with a notice.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::{
    GuestDirectory, GuestDirectoryError, GuestPortal, IdentityBackend, IdentityBackendError,
    Resumed, SignUpOutcome, Transition,
};
use crate::domain::{
    AuthSession, AuthValidationError, Email, Error, ErrorCode, InvitationCode, LoginCredentials,
    Notice, OneTimeCode, PasswordChange, PortalState, PortalView, Registration, RsvpUpdate,
    render,
};

const SESSION_EXPIRED_TEXT: &str = "Your session has expired. Please sign in again.";

/// Map a local validation failure to an `InvalidRequest` error carrying the
/// rule and field that failed.
pub fn validation_error(err: &AuthValidationError) -> Error {
    Error::invalid_request(err.to_string()).with_details(json!({
        "field": err.field(),
        "code": err.code(),
    }))
}

/// Result of a call made on behalf of a signed-in guest.
enum Authorised<T> {
    /// The call succeeded with `session`, which may have been renewed.
    Done { session: AuthSession, value: T },
    /// The backend rejected the session and it could not be renewed.
    Expired,
}

fn expired(state: &PortalState) -> Transition {
    Transition::new(
        state.clone().session_expired(),
        Notice::error(SESSION_EXPIRED_TEXT),
    )
}

/// Guest portal backed by an identity service and a guest directory.
#[derive(Clone)]
pub struct GuestPortalService<B, D> {
    backend: Arc<B>,
    directory: Arc<D>,
    invitation_code: InvitationCode,
    clock: Arc<dyn Clock>,
}

impl<B, D> GuestPortalService<B, D> {
    /// Create a new service.
    pub fn new(
        backend: Arc<B>,
        directory: Arc<D>,
        invitation_code: InvitationCode,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            backend,
            directory,
            invitation_code,
            clock,
        }
    }
}

impl<B, D> GuestPortalService<B, D>
where
    B: IdentityBackend,
    D: GuestDirectory,
{
    fn map_identity_error(action: &str, error: IdentityBackendError) -> Error {
        warn!(action, %error, "identity backend call failed");
        match error {
            IdentityBackendError::InvalidCredentials { message }
            | IdentityBackendError::InvalidCode { message }
            | IdentityBackendError::Unauthorized { message } => {
                Error::unauthorized(format!("{action} failed: {message}"))
            }
            IdentityBackendError::Rejected { message } => {
                Error::invalid_request(format!("{action} failed: {message}"))
            }
            IdentityBackendError::RateLimited { message } => Error::service_unavailable(format!(
                "{action} failed: too many attempts, try again later ({message})"
            )),
            IdentityBackendError::Transport { message }
            | IdentityBackendError::Timeout { message } => Error::service_unavailable(format!(
                "{action} failed: service unavailable ({message})"
            )),
            IdentityBackendError::Decode { message } => {
                Error::internal(format!("identity backend returned an invalid response: {message}"))
            }
        }
    }

    fn map_directory_error(action: &str, error: GuestDirectoryError) -> Error {
        warn!(action, %error, "guest directory call failed");
        match error {
            GuestDirectoryError::Unauthorized { message } => {
                Error::unauthorized(format!("{action} failed: {message}"))
            }
            GuestDirectoryError::Rejected { message } => {
                Error::invalid_request(format!("{action} failed: {message}"))
            }
            GuestDirectoryError::Transport { message }
            | GuestDirectoryError::Timeout { message } => Error::service_unavailable(format!(
                "{action} failed: service unavailable ({message})"
            )),
            GuestDirectoryError::Decode { message } => Error::internal(format!(
                "guest directory returned an invalid response: {message}"
            )),
        }
    }

    /// Exchange the session's refresh token; `None` when the session cannot
    /// be renewed.
    async fn refresh(&self, session: &AuthSession) -> Result<Option<AuthSession>, Error> {
        let user_id = session.identity().id();
        let Some(refresh_token) = session.refresh_token() else {
            info!(%user_id, "session rejected and no refresh token is held");
            return Ok(None);
        };
        match self.backend.refresh_session(refresh_token).await {
            Ok(renewed) => {
                info!(%user_id, "session renewed");
                Ok(Some(renewed))
            }
            Err(
                error @ (IdentityBackendError::Transport { .. }
                | IdentityBackendError::Timeout { .. }
                | IdentityBackendError::RateLimited { .. }
                | IdentityBackendError::Decode { .. }),
            ) => Err(Self::map_identity_error("session refresh", error)),
            Err(error) => {
                info!(%user_id, %error, "session refresh refused");
                Ok(None)
            }
        }
    }

    /// Run `call` with a session the backend accepts.
    ///
    /// Renews the session up front when it is about to expire, or once after
    /// `call` fails with [`ErrorCode::Unauthorized`], retrying it with the new
    /// tokens. Other failures are returned unchanged.
    async fn authorised<T, F, Fut>(
        &self,
        session: &AuthSession,
        call: F,
    ) -> Result<Authorised<T>, Error>
    where
        F: Fn(AuthSession) -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, Error>> + Send,
        T: Send,
    {
        let mut current = session.clone();
        let mut renewed = false;
        if current.needs_refresh(self.clock.utc()) {
            let Some(fresh) = self.refresh(&current).await? else {
                return Ok(Authorised::Expired);
            };
            current = fresh;
            renewed = true;
        }
        match call(current.clone()).await {
            Ok(value) => Ok(Authorised::Done {
                session: current,
                value,
            }),
            Err(error) if error.code() != ErrorCode::Unauthorized => Err(error),
            Err(_) if renewed => Ok(Authorised::Expired),
            Err(_) => {
                let Some(fresh) = self.refresh(&current).await? else {
                    return Ok(Authorised::Expired);
                };
                match call(fresh.clone()).await {
                    Ok(value) => Ok(Authorised::Done {
                        session: fresh,
                        value,
                    }),
                    Err(error) if error.code() == ErrorCode::Unauthorized => {
                        Ok(Authorised::Expired)
                    }
                    Err(error) => Err(error),
                }
            }
        }
    }
}

#[async_trait]
impl<B, D> GuestPortal for GuestPortalService<B, D>
where
    B: IdentityBackend,
    D: GuestDirectory,
{
    async fn view(&self, state: &PortalState) -> PortalView {
        let profile = match state.auth_session() {
            Some(session) => match self.directory.fetch_own_profile(session).await {
                Ok(profile) => profile,
                Err(error) => {
                    warn!(
                        user_id = %session.identity().id(),
                        %error,
                        "profile fetch failed; rendering defaults"
                    );
                    None
                }
            },
            None => None,
        };
        render(state, profile.as_ref(), self.clock.utc())
    }

    async fn resume(&self, state: &PortalState) -> Resumed {
        let now = self.clock.utc();
        let Some(session) = state.auth_session() else {
            return Resumed {
                view: render(state, None, now),
                transition: Transition::silent(state.clone()),
            };
        };
        let directory = &self.directory;
        let outcome = self
            .authorised(session, |session| async move {
                directory
                    .fetch_own_profile(&session)
                    .await
                    .map_err(|err| Self::map_directory_error("loading the profile", err))
            })
            .await;
        let (transition, profile) = match outcome {
            Ok(Authorised::Done { session, value }) => (
                Transition::silent(state.clone().session_renewed(session)),
                value,
            ),
            Ok(Authorised::Expired) => (expired(state), None),
            Err(error) => {
                warn!(
                    user_id = %session.identity().id(),
                    %error,
                    "profile fetch failed; rendering defaults"
                );
                (Transition::silent(state.clone()), None)
            }
        };
        let view = render(&transition.state, profile.as_ref(), now);
        Resumed { transition, view }
    }

    async fn sign_in(
        &self,
        state: &PortalState,
        credentials: LoginCredentials,
    ) -> Result<Transition, Error> {
        state.require_unauthenticated()?;
        let session = self
            .backend
            .sign_in(&credentials)
            .await
            .map_err(|err| Self::map_identity_error("sign-in", err))?;
        info!(user_id = %session.identity().id(), "guest signed in with password");
        Ok(Transition::new(
            state.clone().signed_in(session),
            Notice::success("Welcome!"),
        ))
    }

    async fn register(
        &self,
        state: &PortalState,
        registration: Registration,
        invitation_code: String,
    ) -> Result<Transition, Error> {
        state.require_unauthenticated()?;
        if !self.invitation_code.matches(&invitation_code) {
            info!("registration refused: invitation code mismatch");
            return Err(validation_error(&AuthValidationError::InvitationMismatch));
        }
        let outcome = self
            .backend
            .create_account(&registration)
            .await
            .map_err(|err| Self::map_identity_error("registration", err))?;
        match outcome {
            SignUpOutcome::Created => {
                info!("guest account registered");
                Ok(Transition::new(
                    state.clone(),
                    Notice::success("Registration successful! Now sign in."),
                ))
            }
            SignUpOutcome::AlreadyRegistered => Err(Error::invalid_request(
                "this email is already registered or awaits email confirmation",
            )
            .with_details(json!({ "field": "email", "code": "already_registered" }))),
        }
    }

    async fn request_code(
        &self,
        state: &PortalState,
        email: String,
    ) -> Result<Transition, Error> {
        state.require_anonymous()?;
        let email = Email::new(&email)
            .map_err(|err| validation_error(&AuthValidationError::Email(err)))?;
        self.backend
            .request_one_time_code(&email)
            .await
            .map_err(|err| Self::map_identity_error("sending the code", err))?;
        info!("one-time code requested");
        Ok(Transition::new(
            state.clone().recovery_requested(email),
            Notice::success("Code sent to your email!"),
        ))
    }

    async fn verify_code(&self, state: &PortalState, code: String) -> Result<Transition, Error> {
        let email = state.require_recovery()?;
        let code = OneTimeCode::new(&code).map_err(|err| validation_error(&err))?;
        let session = self
            .backend
            .verify_one_time_code(email, &code)
            .await
            .map_err(|err| Self::map_identity_error("code verification", err))?;
        info!(user_id = %session.identity().id(), "guest signed in with one-time code");
        Ok(Transition::new(
            state.clone().signed_in(session),
            Notice::success("Signed in successfully!"),
        ))
    }

    async fn cancel_recovery(&self, state: &PortalState) -> Result<Transition, Error> {
        state.require_unauthenticated()?;
        Ok(Transition::silent(state.clone().recovery_cancelled()))
    }

    async fn update_rsvp(
        &self,
        state: &PortalState,
        update: RsvpUpdate,
    ) -> Result<Transition, Error> {
        let session = state.require_session()?;
        let directory = &self.directory;
        let update = &update;
        let outcome = self
            .authorised(session, |session| async move {
                directory
                    .update_own_profile(&session, update)
                    .await
                    .map_err(|err| Self::map_directory_error("saving", err))
            })
            .await?;
        let Authorised::Done { session, .. } = outcome else {
            return Ok(expired(state));
        };
        info!(
            user_id = %session.identity().id(),
            attendance = %update.attendance_status,
            "rsvp saved"
        );
        Ok(Transition::new(
            state.clone().session_renewed(session),
            Notice::success("Your answer has been saved!"),
        ))
    }

    async fn change_password(
        &self,
        state: &PortalState,
        change: PasswordChange,
    ) -> Result<Transition, Error> {
        let session = state.require_session()?;
        let backend = &self.backend;
        let change = &change;
        let outcome = self
            .authorised(session, |session| async move {
                backend
                    .change_password(&session, change)
                    .await
                    .map_err(|err| Self::map_identity_error("password change", err))
            })
            .await?;
        let Authorised::Done { session, .. } = outcome else {
            return Ok(expired(state));
        };
        info!(user_id = %session.identity().id(), "password changed");
        Ok(Transition::new(
            state.clone().session_renewed(session),
            Notice::success("Password changed successfully!"),
        ))
    }

    async fn sign_out(&self, state: &PortalState) -> Result<Transition, Error> {
        let session = state.require_session()?;
        if let Err(error) = self.backend.sign_out(session).await {
            warn!(
                user_id = %session.identity().id(),
                %error,
                "backend sign-out failed; clearing local session anyway"
            );
        }
        info!(user_id = %session.identity().id(), "guest signed out");
        Ok(Transition::new(
            state.clone().signed_out(),
            Notice::info("You have signed out."),
        ))
    }
}

#[cfg(test)]
#[path = "portal_service_tests.rs"]
mod tests;
