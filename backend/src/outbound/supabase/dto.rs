//! Wire DTOs for the Supabase auth and REST endpoints.
//!
//! Responses decode into these transport types first and then map into
//! domain values in one pass.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{
    AccessToken, AttendanceStatus, AuthSession, DisplayName, Email, GuestProfile, Identity,
    RefreshToken, RsvpUpdate, UserId,
};

/// Labels the guest table stores for each attendance answer.
const ATTENDING_LABEL: &str = "Я приду";
const NOT_ATTENDING_LABEL: &str = "Не смогу";
const UNDECIDED_LABEL: &str = "Думаю";

pub(super) fn attendance_to_stored(status: AttendanceStatus) -> &'static str {
    match status {
        AttendanceStatus::Attending => ATTENDING_LABEL,
        AttendanceStatus::NotAttending => NOT_ATTENDING_LABEL,
        AttendanceStatus::Undecided => UNDECIDED_LABEL,
    }
}

/// Stored labels and wire names both decode; anything else reads as
/// undecided.
pub(super) fn attendance_from_stored(raw: Option<&str>) -> AttendanceStatus {
    match raw.map(str::trim) {
        Some(ATTENDING_LABEL | "attending") => AttendanceStatus::Attending,
        Some(NOT_ATTENDING_LABEL | "not_attending") => AttendanceStatus::NotAttending,
        _ => AttendanceStatus::Undecided,
    }
}

/// Error body; GoTrue and PostgREST disagree on the field names.
#[derive(Debug, Default, Deserialize)]
pub(super) struct BackendErrorDto {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
    error_code: Option<String>,
}

impl BackendErrorDto {
    pub(super) fn into_message(self) -> Option<String> {
        [
            self.msg,
            self.message,
            self.error_description,
            self.error,
            self.error_code,
        ]
        .into_iter()
        .flatten()
        .map(|text| text.trim().to_owned())
        .find(|text| !text.is_empty())
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct UserMetadataDto {
    full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserDto {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadataDto,
    identities: Option<Vec<Value>>,
}

impl UserDto {
    /// GoTrue answers a repeated sign-up with a user that has no identities.
    pub(super) fn has_identities(&self) -> bool {
        self.identities
            .as_ref()
            .is_none_or(|identities| !identities.is_empty())
    }

    fn into_identity(self) -> Result<Identity, String> {
        let id = UserId::new(&self.id).map_err(|error| format!("user id {}: {error}", self.id))?;
        let email = self
            .email
            .as_deref()
            .ok_or_else(|| format!("user {} has no email", self.id))
            .and_then(|raw| Email::new(raw).map_err(|error| format!("user email: {error}")))?;
        let display_name = self
            .user_metadata
            .full_name
            .and_then(|name| DisplayName::new(name).ok());
        Ok(Identity::new(id, email, display_name))
    }
}

/// Response of the password, one-time-code and refresh grants.
#[derive(Debug, Deserialize)]
pub(super) struct SessionDto {
    access_token: String,
    refresh_token: Option<String>,
    /// Unix seconds.
    expires_at: Option<i64>,
    /// Seconds from issue.
    expires_in: Option<i64>,
    user: UserDto,
}

impl SessionDto {
    /// Map into a domain session; `issued_at` anchors `expires_in` when the
    /// absolute expiry is absent.
    pub(super) fn into_domain(self, issued_at: DateTime<Utc>) -> Result<AuthSession, String> {
        let identity = self.user.into_identity()?;
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| {
                self.expires_in
                    .and_then(TimeDelta::try_seconds)
                    .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            });
        Ok(AuthSession::new(identity, AccessToken::new(self.access_token))
            .with_refresh(self.refresh_token.map(RefreshToken::new), expires_at))
    }
}

/// Sign-up answers with a session when email confirmation is disabled and
/// with the bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum SignUpResponseDto {
    Session(SessionDto),
    User(UserDto),
}

impl SignUpResponseDto {
    pub(super) fn user(&self) -> &UserDto {
        match self {
            Self::Session(session) => &session.user,
            Self::User(user) => user,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SignUpMetadataDto<'a> {
    pub(super) full_name: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct SignUpRequestDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
    pub(super) data: SignUpMetadataDto<'a>,
}

#[derive(Debug, Serialize)]
pub(super) struct PasswordGrantDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct OtpRequestDto<'a> {
    pub(super) email: &'a str,
    pub(super) create_user: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct VerifyRequestDto<'a> {
    #[serde(rename = "type")]
    pub(super) kind: &'static str,
    pub(super) email: &'a str,
    pub(super) token: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct RefreshGrantDto<'a> {
    pub(super) refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct PasswordUpdateDto<'a> {
    pub(super) password: &'a str,
}

/// One row of the guest table.
#[derive(Debug, Deserialize)]
pub(super) struct GuestRowDto {
    id: String,
    full_name: Option<String>,
    attendance_status: Option<String>,
    food_preference: Option<String>,
}

impl GuestRowDto {
    pub(super) fn into_domain(self) -> Result<GuestProfile, String> {
        let id = UserId::new(&self.id).map_err(|error| format!("guest id {}: {error}", self.id))?;
        Ok(GuestProfile {
            id,
            full_name: self.full_name,
            attendance_status: attendance_from_stored(self.attendance_status.as_deref()),
            food_preference: self.food_preference.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Serialize)]
pub(super) struct GuestUpdateDto<'a> {
    attendance_status: &'static str,
    food_preference: &'a str,
}

impl<'a> From<&'a RsvpUpdate> for GuestUpdateDto<'a> {
    fn from(update: &'a RsvpUpdate) -> Self {
        Self {
            attendance_status: attendance_to_stored(update.attendance_status),
            food_preference: update.food_preference.as_str(),
        }
    }
}
