//! View model and the pure render pass.
//!
//! [`render`] branches on the portal state into exactly one of two view
//! trees. It performs no I/O; the caller supplies the profile row (already
//! fetched) and the current time.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::auth::PASSWORD_MIN_EXCLUSIVE;
use super::event::{Countdown, EventDetails, EventHeader};
use super::guest::{AttendanceStatus, GuestProfile};
use super::state::PortalState;

/// Root of the rendered view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PortalView {
    Anonymous(AnonymousView),
    Authenticated(AuthenticatedView),
}

/// Sign-in, sign-up and recovery tabs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonymousView {
    pub header: EventHeader,
    pub recovery: RecoveryView,
}

/// Which half of the recovery tab is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum RecoveryView {
    RequestCode,
    EnterCode { email: String },
}

/// Invitation, RSVP and settings tabs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedView {
    pub header: EventHeader,
    pub greeting_name: String,
    pub invitation: InvitationTab,
    pub rsvp: RsvpForm,
    pub settings: SettingsTab,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationTab {
    pub details: EventDetails,
    pub countdown: Countdown,
}

/// RSVP form prefilled from the stored profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpForm {
    pub options: Vec<RsvpOption>,
    pub food_preference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RsvpOption {
    pub value: AttendanceStatus,
    pub label: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsTab {
    pub email: String,
    pub password_form_expanded: bool,
    pub password_min_length: usize,
}

impl RsvpForm {
    fn for_profile(profile: &GuestProfile) -> Self {
        let options = AttendanceStatus::ALL
            .into_iter()
            .map(|status| RsvpOption {
                value: status,
                label: status.label(),
                selected: status == profile.attendance_status,
            })
            .collect();
        Self {
            options,
            food_preference: profile.food_preference.clone(),
        }
    }
}

/// Build the view for `state`.
///
/// `profile` is only consulted in the authenticated branch; a missing row
/// renders as [`GuestProfile::empty`] for the session's identity.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use wedding_rsvp::domain::{render, PortalState, PortalView};
///
/// let view = render(&PortalState::Anonymous, None, Utc::now());
/// assert!(matches!(view, PortalView::Anonymous(_)));
/// ```
pub fn render(
    state: &PortalState,
    profile: Option<&GuestProfile>,
    now: DateTime<Utc>,
) -> PortalView {
    let header = EventHeader::wedding();
    let session = match state {
        PortalState::Anonymous => {
            return PortalView::Anonymous(AnonymousView {
                header,
                recovery: RecoveryView::RequestCode,
            });
        }
        PortalState::RecoveryRequested { email } => {
            return PortalView::Anonymous(AnonymousView {
                header,
                recovery: RecoveryView::EnterCode {
                    email: email.to_string(),
                },
            });
        }
        PortalState::Authenticated { session } => session,
    };

    let identity = session.identity();
    let fallback;
    let profile = match profile {
        Some(profile) if profile.id == *identity.id() => profile,
        _ => {
            fallback = GuestProfile::empty(identity.id().clone());
            &fallback
        }
    };
    let details = EventDetails::wedding();
    let countdown = Countdown::until(details.starts_at, now);

    PortalView::Authenticated(AuthenticatedView {
        header,
        greeting_name: profile.greeting_name().to_owned(),
        invitation: InvitationTab { details, countdown },
        rsvp: RsvpForm::for_profile(profile),
        settings: SettingsTab {
            email: identity.email().to_string(),
            password_form_expanded: true,
            password_min_length: PASSWORD_MIN_EXCLUSIVE + 1,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccessToken, AuthSession, Email, Identity, UserId, ceremony_starts_at};
    use rstest::{fixture, rstest};

    #[fixture]
    fn session() -> AuthSession {
        let identity = Identity::new(
            UserId::random(),
            Email::new("a@x.com").expect("email"),
            None,
        );
        AuthSession::new(identity, AccessToken::new("token"))
    }

    fn authenticated(view: PortalView) -> AuthenticatedView {
        match view {
            PortalView::Authenticated(view) => view,
            PortalView::Anonymous(_) => panic!("expected the authenticated tree"),
        }
    }

    fn selected(form: &RsvpForm) -> Vec<AttendanceStatus> {
        form.options
            .iter()
            .filter(|option| option.selected)
            .map(|option| option.value)
            .collect()
    }

    #[rstest]
    fn recovery_state_shows_code_entry() {
        let email = Email::new("b@x.com").expect("email");
        let view = render(
            &PortalState::Anonymous.recovery_requested(email),
            None,
            Utc::now(),
        );
        let PortalView::Anonymous(view) = view else {
            panic!("expected the anonymous tree");
        };
        assert_eq!(
            view.recovery,
            RecoveryView::EnterCode {
                email: "b@x.com".into()
            }
        );
    }

    #[rstest]
    fn missing_profile_degrades_to_defaults(session: AuthSession) {
        let state = PortalState::Anonymous.signed_in(session);
        let view = authenticated(render(&state, None, ceremony_starts_at()));

        assert_eq!(view.greeting_name, "Guest");
        assert_eq!(selected(&view.rsvp), [AttendanceStatus::Undecided]);
        assert_eq!(view.rsvp.food_preference, "");
        assert_eq!(view.invitation.countdown, Countdown::Started);
        assert!(view.settings.password_form_expanded);
        assert_eq!(view.settings.email, "a@x.com");
    }

    #[rstest]
    fn stored_profile_prefills_the_form(session: AuthSession) {
        let profile = GuestProfile {
            id: session.identity().id().clone(),
            full_name: Some("Test".into()),
            attendance_status: AttendanceStatus::Attending,
            food_preference: "vegetarian".into(),
        };
        let state = PortalState::Anonymous.signed_in(session);
        let view = authenticated(render(&state, Some(&profile), Utc::now()));

        assert_eq!(view.greeting_name, "Test");
        assert_eq!(selected(&view.rsvp), [AttendanceStatus::Attending]);
        assert_eq!(view.rsvp.food_preference, "vegetarian");
    }

    #[rstest]
    fn foreign_profile_is_ignored(session: AuthSession) {
        let mut profile = GuestProfile::empty(UserId::random());
        profile.full_name = Some("Someone else".into());
        let state = PortalState::Anonymous.signed_in(session);
        let view = authenticated(render(&state, Some(&profile), Utc::now()));
        assert_eq!(view.greeting_name, "Guest");
    }

    #[rstest]
    fn view_serialises_with_kind_tag(session: AuthSession) {
        let state = PortalState::Anonymous.signed_in(session);
        let value = serde_json::to_value(render(&state, None, Utc::now())).expect("serialise");
        assert_eq!(value["kind"], "authenticated");
        assert_eq!(value["rsvp"]["options"][2]["value"], "undecided");
        assert_eq!(value["rsvp"]["options"][2]["selected"], true);
    }
}
