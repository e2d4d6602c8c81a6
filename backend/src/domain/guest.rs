//! Guest profile rows and RSVP answers.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::user::UserId;

/// Greeting used when the profile row carries no name.
pub const GUEST_NAME_FALLBACK: &str = "Guest";

/// Whether the guest will attend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// The guest is coming.
    Attending,
    /// The guest cannot come.
    NotAttending,
    /// The guest has not decided yet; also the answer assumed for new rows.
    #[default]
    Undecided,
}

impl AttendanceStatus {
    /// Options in the order the RSVP form lists them.
    pub const ALL: [Self; 3] = [Self::Attending, Self::NotAttending, Self::Undecided];

    /// Human-readable label for the RSVP form.
    pub fn label(self) -> &'static str {
        match self {
            Self::Attending => "I will come",
            Self::NotAttending => "I can't make it",
            Self::Undecided => "Still thinking",
        }
    }

    /// Stable identifier used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Attending => "attending",
            Self::NotAttending => "not_attending",
            Self::Undecided => "undecided",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted guest record keyed by the identity id.
///
/// ## Invariants
/// - `id` equals the owning identity's id.
/// - `attendance_status` defaults to [`AttendanceStatus::Undecided`] when the
///   stored value is missing or unrecognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestProfile {
    pub id: UserId,
    pub full_name: Option<String>,
    pub attendance_status: AttendanceStatus,
    pub food_preference: String,
}

impl GuestProfile {
    /// Profile rendered when the backend returns no row for `id`.
    ///
    /// # Examples
    /// ```
    /// use wedding_rsvp::domain::{AttendanceStatus, GuestProfile, UserId};
    ///
    /// let profile = GuestProfile::empty(UserId::random());
    /// assert_eq!(profile.greeting_name(), "Guest");
    /// assert_eq!(profile.attendance_status, AttendanceStatus::Undecided);
    /// ```
    pub fn empty(id: UserId) -> Self {
        Self {
            id,
            full_name: None,
            attendance_status: AttendanceStatus::default(),
            food_preference: String::new(),
        }
    }

    /// Name used in the authenticated greeting.
    pub fn greeting_name(&self) -> &str {
        self.full_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(GUEST_NAME_FALLBACK)
    }
}

/// Answer submitted through the RSVP form.
///
/// Carries no guest id: the portal service always writes to the row of the
/// authenticated identity. Food preferences are free text and are not
/// validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsvpUpdate {
    pub attendance_status: AttendanceStatus,
    pub food_preference: String,
}
