//! Authentication inputs and the authenticated session.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to the portal service.
//! Secrets are held in [`Zeroizing`] buffers and never appear in `Debug`
//! output.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::user::{DisplayName, Email, Identity, UserValidationError};

/// Passwords must be strictly longer than this many characters.
pub const PASSWORD_MIN_EXCLUSIVE: usize = 5;

/// Sessions are renewed once their token is this close to expiry.
pub const SESSION_REFRESH_LEEWAY_SECS: i64 = 60;

/// Domain error returned when authentication inputs are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthValidationError {
    /// Email was missing or malformed.
    Email(UserValidationError),
    /// Display name was missing or too long.
    DisplayName(UserValidationError),
    /// Password was blank.
    EmptyPassword,
    /// One-time code was blank.
    EmptyCode,
    /// Supplied invitation code does not match the configured one.
    InvitationMismatch,
    /// New password and its confirmation differ.
    PasswordMismatch,
    /// New password is not longer than [`PASSWORD_MIN_EXCLUSIVE`] characters.
    PasswordTooShort,
}

impl AuthValidationError {
    /// Stable identifier used in error details.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Email(UserValidationError::EmptyEmail) => "empty_email",
            Self::Email(_) => "invalid_email",
            Self::DisplayName(UserValidationError::EmptyDisplayName) => "empty_name",
            Self::DisplayName(_) => "invalid_name",
            Self::EmptyPassword => "empty_password",
            Self::EmptyCode => "empty_code",
            Self::InvitationMismatch => "invalid_invitation_code",
            Self::PasswordMismatch => "password_mismatch",
            Self::PasswordTooShort => "password_too_short",
        }
    }

    /// Name of the offending input field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Email(_) => "email",
            Self::DisplayName(_) => "fullName",
            Self::EmptyPassword => "password",
            Self::EmptyCode => "code",
            Self::InvitationMismatch => "invitationCode",
            Self::PasswordMismatch => "confirmPassword",
            Self::PasswordTooShort => "newPassword",
        }
    }
}

impl fmt::Display for AuthValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email(UserValidationError::EmptyEmail) => write!(f, "enter an email"),
            Self::Email(err) | Self::DisplayName(err) => write!(f, "{err}"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::EmptyCode => write!(f, "enter the code from the email"),
            Self::InvitationMismatch => write!(f, "invalid wedding invitation code"),
            Self::PasswordMismatch => write!(f, "passwords do not match"),
            Self::PasswordTooShort => write!(
                f,
                "password must be longer than {PASSWORD_MIN_EXCLUSIVE} characters"
            ),
        }
    }
}

impl std::error::Error for AuthValidationError {}

fn non_empty_password(password: &str) -> Result<Zeroizing<String>, AuthValidationError> {
    if password.is_empty() {
        return Err(AuthValidationError::EmptyPassword);
    }
    Ok(Zeroizing::new(password.to_owned()))
}

/// Validated email/password pair.
///
/// ## Invariants
/// - `email` is a normalised [`Email`].
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use wedding_rsvp::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("a@x.com", "hunter2").unwrap();
/// assert_eq!(creds.email().as_ref(), "a@x.com");
/// assert_eq!(creds.password(), "hunter2");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: Email,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, AuthValidationError> {
        let email = Email::new(email).map_err(AuthValidationError::Email)?;
        let password = non_empty_password(password)?;
        Ok(Self { email, password })
    }

    /// Email used as the account name.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Self-registration request for a new guest account.
///
/// The invitation code is checked separately by the portal service so that a
/// mismatch never reaches the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    display_name: DisplayName,
    credentials: LoginCredentials,
}

impl Registration {
    /// Validate the registration form fields.
    pub fn try_from_parts(
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<Self, AuthValidationError> {
        let display_name = DisplayName::new(full_name).map_err(AuthValidationError::DisplayName)?;
        let credentials = LoginCredentials::try_from_parts(email, password)?;
        Ok(Self {
            display_name,
            credentials,
        })
    }

    /// Name stored as account metadata and on the profile row.
    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    /// Credentials the account will sign in with.
    pub fn credentials(&self) -> &LoginCredentials {
        &self.credentials
    }
}

/// Shared secret printed on the invitation; gates self-registration.
#[derive(Clone)]
pub struct InvitationCode(Zeroizing<String>);

impl InvitationCode {
    /// Wrap the configured invitation code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(Zeroizing::new(code.into()))
    }

    /// Exact comparison against a guest-supplied code.
    ///
    /// # Examples
    /// ```
    /// use wedding_rsvp::domain::InvitationCode;
    ///
    /// let code = InvitationCode::new("2026");
    /// assert!(code.matches("2026"));
    /// assert!(!code.matches(" 2026"));
    /// ```
    pub fn matches(&self, supplied: &str) -> bool {
        self.0.as_str() == supplied
    }
}

impl fmt::Debug for InvitationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InvitationCode(<redacted>)")
    }
}

/// Code delivered by email for password-less sign-in.
#[derive(Clone, PartialEq, Eq)]
pub struct OneTimeCode(Zeroizing<String>);

impl OneTimeCode {
    /// Validate a guest-supplied code; surrounding whitespace is dropped.
    pub fn new(raw: &str) -> Result<Self, AuthValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AuthValidationError::EmptyCode);
        }
        Ok(Self(Zeroizing::new(trimmed.to_owned())))
    }

    /// Code text as sent to the backend.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for OneTimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OneTimeCode(<redacted>)")
    }
}

/// Replacement password confirmed by the guest.
///
/// ## Invariants
/// - The new password equals its confirmation exactly.
/// - It is longer than [`PASSWORD_MIN_EXCLUSIVE`] characters.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordChange(Zeroizing<String>);

impl PasswordChange {
    /// Check the pair of inputs from the settings form.
    ///
    /// # Examples
    /// ```
    /// use wedding_rsvp::domain::{AuthValidationError, PasswordChange};
    ///
    /// assert!(PasswordChange::try_from_parts("hunter22", "hunter22").is_ok());
    /// assert_eq!(
    ///     PasswordChange::try_from_parts("hunter", "hunter2"),
    ///     Err(AuthValidationError::PasswordMismatch)
    /// );
    /// ```
    pub fn try_from_parts(
        new_password: &str,
        confirmation: &str,
    ) -> Result<Self, AuthValidationError> {
        if new_password != confirmation {
            return Err(AuthValidationError::PasswordMismatch);
        }
        if new_password.chars().count() <= PASSWORD_MIN_EXCLUSIVE {
            return Err(AuthValidationError::PasswordTooShort);
        }
        Ok(Self(Zeroizing::new(new_password.to_owned())))
    }

    /// New password as sent to the backend.
    pub fn new_password(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordChange(<redacted>)")
    }
}

/// Opaque bearer token issued by the identity backend.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct AccessToken(Zeroizing<String>);

impl AccessToken {
    /// Wrap a backend-issued token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(Zeroizing::new(token.into()))
    }

    /// Token text for `Authorization` headers.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl From<String> for AccessToken {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<AccessToken> for String {
    fn from(value: AccessToken) -> Self {
        value.0.as_str().to_owned()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Long-lived token exchanged for a fresh access token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RefreshToken(Zeroizing<String>);

impl RefreshToken {
    /// Wrap a backend-issued refresh token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(Zeroizing::new(token.into()))
    }

    /// Token text for the refresh grant.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl From<String> for RefreshToken {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<RefreshToken> for String {
    fn from(value: RefreshToken) -> Self {
        value.0.as_str().to_owned()
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefreshToken(<redacted>)")
    }
}

/// Identity plus the tokens that authorise calls on its behalf.
///
/// ## Invariants
/// - Without a refresh token the session cannot be renewed and ends when the
///   access token stops working.
/// - Without `expires_at` the session is only renewed after the backend
///   rejects the access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    identity: Identity,
    access_token: AccessToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<RefreshToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

impl AuthSession {
    /// Pair an identity with its access token.
    pub fn new(identity: Identity, access_token: AccessToken) -> Self {
        Self {
            identity,
            access_token,
            refresh_token: None,
            expires_at: None,
        }
    }

    /// Attach the refresh token and access-token expiry issued with it.
    pub fn with_refresh(
        mut self,
        refresh_token: Option<RefreshToken>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.refresh_token = refresh_token;
        self.expires_at = expires_at;
        self
    }

    /// Token for renewing the session, if the backend issued one.
    pub fn refresh_token(&self) -> Option<&RefreshToken> {
        self.refresh_token.as_ref()
    }

    /// Instant the access token stops being accepted, if known.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Whether the access token expires within
    /// [`SESSION_REFRESH_LEEWAY_SECS`] of `now`.
    ///
    /// # Examples
    /// ```
    /// use chrono::{TimeDelta, Utc};
    /// use wedding_rsvp::domain::{AccessToken, AuthSession, Email, Identity, UserId};
    ///
    /// let identity = Identity::new(UserId::random(), Email::new("a@x.com").unwrap(), None);
    /// let now = Utc::now();
    /// let session = AuthSession::new(identity, AccessToken::new("jwt"))
    ///     .with_refresh(None, Some(now + TimeDelta::seconds(30)));
    /// assert!(session.needs_refresh(now));
    /// assert!(!session.needs_refresh(now - TimeDelta::hours(1)));
    /// ```
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        let leeway = TimeDelta::try_seconds(SESSION_REFRESH_LEEWAY_SECS).unwrap_or_default();
        self.expires_at.is_some_and(|expires_at| now + leeway >= expires_at)
    }

    /// Authenticated guest.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Bearer token for backend calls.
    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", "empty_email")]
    #[case("nope", "pw", "invalid_email")]
    #[case("a@x.com", "", "empty_password")]
    fn invalid_credentials(#[case] email: &str, #[case] password: &str, #[case] code: &str) {
        let err = LoginCredentials::try_from_parts(email, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err.code(), code);
    }

    #[rstest]
    #[case("new", "other", AuthValidationError::PasswordMismatch)]
    #[case("12345", "12345", AuthValidationError::PasswordTooShort)]
    #[case("", "", AuthValidationError::PasswordTooShort)]
    #[case("пароль", "парол", AuthValidationError::PasswordMismatch)]
    fn password_change_rejects(
        #[case] new_password: &str,
        #[case] confirmation: &str,
        #[case] expected: AuthValidationError,
    ) {
        assert_eq!(
            PasswordChange::try_from_parts(new_password, confirmation),
            Err(expected)
        );
    }

    #[rstest]
    fn password_length_counts_characters_not_bytes() {
        let change = PasswordChange::try_from_parts("пароль", "пароль").expect("six characters");
        assert_eq!(change.new_password(), "пароль");
    }

    #[rstest]
    fn registration_requires_a_name() {
        let err = Registration::try_from_parts("  ", "a@x.com", "hunter2").expect_err("no name");
        assert_eq!(err.code(), "empty_name");
    }

    #[rstest]
    fn secrets_are_redacted_in_debug_output() {
        let creds = LoginCredentials::try_from_parts("a@x.com", "hunter2").expect("valid");
        let token = AccessToken::new("secret-token");
        let rendered = format!("{creds:?} {token:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("secret-token"));
    }

    #[rstest]
    fn sessions_without_refresh_fields_still_decode() {
        let value = serde_json::json!({
            "identity": {
                "id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
                "email": "a@x.com",
                "displayName": null
            },
            "accessToken": "jwt"
        });
        let session: AuthSession = serde_json::from_value(value).expect("decodes");
        assert!(session.refresh_token().is_none());
        assert!(!session.needs_refresh(Utc::now()));
    }

    #[rstest]
    fn one_time_code_is_trimmed() {
        let code = OneTimeCode::new(" 123456 ").expect("valid code");
        assert_eq!(code.as_str(), "123456");
        assert_eq!(OneTimeCode::new("  "), Err(AuthValidationError::EmptyCode));
    }
}
