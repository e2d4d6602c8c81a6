//! Domain primitives, the portal state machine and its service.
//!
//! Purpose: define the strongly typed values the portal passes between its
//! adapters, the per-client [`PortalState`], the pure [`render`] pass and the
//! [`GuestPortalService`] implementing the driving port.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Identity, AuthSession and the credential inputs.
//! - GuestProfile, AttendanceStatus, RsvpUpdate.
//! - PortalState, PortalView, render.

pub mod auth;
pub mod error;
pub mod event;
pub mod guest;
pub mod notice;
pub mod portal_service;
pub mod ports;
pub mod state;
pub mod user;
pub mod view;

pub use self::auth::{
    AccessToken, AuthSession, AuthValidationError, InvitationCode, LoginCredentials, OneTimeCode,
    PASSWORD_MIN_EXCLUSIVE, PasswordChange, RefreshToken, Registration,
    SESSION_REFRESH_LEEWAY_SECS,
};
pub use self::error::{Error, ErrorCode};
pub use self::event::{
    CEREMONY_STARTS_AT_UNIX, Countdown, EventDetails, EventHeader, ProgrammeItem, VenueMap,
    ceremony_starts_at, static_map_url,
};
pub use self::guest::{AttendanceStatus, GUEST_NAME_FALLBACK, GuestProfile, RsvpUpdate};
pub use self::notice::{Notice, NoticeLevel};
pub use self::portal_service::{GuestPortalService, validation_error};
pub use self::state::PortalState;
pub use self::user::{DisplayName, Email, Identity, UserId, UserValidationError};
pub use self::view::{
    AnonymousView, AuthenticatedView, InvitationTab, PortalView, RecoveryView, RsvpForm,
    RsvpOption, SettingsTab, render,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use wedding_rsvp::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::conflict("already signed in"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
