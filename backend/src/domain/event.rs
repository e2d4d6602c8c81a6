//! Fixed wedding details and the ceremony countdown.
//!
//! Everything here is static apart from [`Countdown`], which is derived from
//! the current time on each render.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

/// Ceremony start: 8 August 2026, 15:00 in Taraz (UTC+5).
pub const CEREMONY_STARTS_AT_UNIX: i64 = 1_786_183_200;

pub const VENUE_LATITUDE: f64 = 42.923_482;
pub const VENUE_LONGITUDE: f64 = 71.419_786;
const MAP_ZOOM: u8 = 18;
const MAP_SIZE: &str = "600,450";

const HERO_IMAGE_URL: &str = "https://images.unsplash.com/photo-1519741497674-611481863552?ixlib=rb-1.2.1&auto=format&fit=crop&w=1350&q=80";
const TWO_GIS_URL: &str =
    "https://2gis.kz/taraz/firm/70000001100842703?m=71.419786%2C42.923482%2F18";

/// Moment the ceremony begins.
pub fn ceremony_starts_at() -> DateTime<Utc> {
    Utc.timestamp_opt(CEREMONY_STARTS_AT_UNIX, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Static map image centred on the venue.
///
/// # Examples
/// ```
/// use wedding_rsvp::domain::static_map_url;
///
/// assert_eq!(
///     static_map_url(),
///     "https://static.maps.2gis.com/1.0?center=71.419786,42.923482&zoom=18&size=600,450"
/// );
/// ```
pub fn static_map_url() -> String {
    format!(
        "https://static.maps.2gis.com/1.0?center={VENUE_LONGITUDE},{VENUE_LATITUDE}&zoom={MAP_ZOOM}&size={MAP_SIZE}"
    )
}

/// Venue location as rendered in both view trees.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueMap {
    pub latitude: f64,
    pub longitude: f64,
    pub image_url: String,
    pub caption: &'static str,
    pub directions_url: &'static str,
}

impl VenueMap {
    pub fn venue() -> Self {
        Self {
            latitude: VENUE_LATITUDE,
            longitude: VENUE_LONGITUDE,
            image_url: static_map_url(),
            caption: "Wedding venue location",
            directions_url: TWO_GIS_URL,
        }
    }
}

/// Public heading shown to every visitor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventHeader {
    pub couple: &'static str,
    pub tagline: &'static str,
    pub date: &'static str,
    pub city: &'static str,
    pub map: VenueMap,
}

impl EventHeader {
    pub fn wedding() -> Self {
        Self {
            couple: "Malika & Beibarys",
            tagline: "We invite you to our wedding!",
            date: "8 August 2026",
            city: "Taraz",
            map: VenueMap::venue(),
        }
    }
}

/// A programme entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgrammeItem {
    pub time: &'static str,
    pub title: &'static str,
}

/// Content of the invitation tab.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    pub hero_image_url: &'static str,
    pub hero_caption: &'static str,
    pub welcome: &'static str,
    pub programme: Vec<ProgrammeItem>,
    pub address: &'static str,
    pub starts_at: DateTime<Utc>,
}

impl EventDetails {
    pub fn wedding() -> Self {
        Self {
            hero_image_url: HERO_IMAGE_URL,
            hero_caption: "We are waiting for you!",
            welcome: "We will be happy to see you on this special day!",
            programme: vec![
                ProgrammeItem {
                    time: "14:00",
                    title: "Guests gather",
                },
                ProgrammeItem {
                    time: "15:00",
                    title: "Ceremony",
                },
                ProgrammeItem {
                    time: "17:00",
                    title: "Banquet",
                },
            ],
            address: "\"Happiness\" estate, 1 Lesnaya St.",
            starts_at: ceremony_starts_at(),
        }
    }
}

/// Time left until the ceremony.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Countdown {
    Upcoming { days: i64, hours: i64, minutes: i64 },
    Started,
}

impl Countdown {
    /// Countdown from `now` to `starts_at`, truncated to whole minutes.
    ///
    /// # Examples
    /// ```
    /// use chrono::{Duration, Utc};
    /// use wedding_rsvp::domain::Countdown;
    ///
    /// let start = Utc::now();
    /// let now = start - Duration::minutes(25 * 60 + 1);
    /// assert_eq!(
    ///     Countdown::until(start, now),
    ///     Countdown::Upcoming { days: 1, hours: 1, minutes: 1 }
    /// );
    /// ```
    pub fn until(starts_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let remaining = starts_at.signed_duration_since(now);
        if remaining <= chrono::Duration::zero() {
            return Self::Started;
        }
        let total_minutes = remaining.num_minutes();
        Self::Upcoming {
            days: total_minutes / (24 * 60),
            hours: (total_minutes / 60) % 24,
            minutes: total_minutes % 60,
        }
    }
}
