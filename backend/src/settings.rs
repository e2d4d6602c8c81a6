//! Portal configuration loaded via OrthoConfig.
//!
//! Values come from `RSVP_*` environment variables, CLI flags or a config
//! file. Only the invitation code is mandatory; without a backend URL the
//! server runs against the in-memory development backend.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Deserializer};
use url::Url;
use zeroize::Zeroizing;

use crate::domain::InvitationCode;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_PROFILE_TABLE: &str = "guests";

/// Errors raised while turning raw settings into typed values.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("RSVP_INVITATION_CODE must be set to a non-empty value")]
    MissingInvitationCode,
    #[error("RSVP_BACKEND_KEY is required when RSVP_BACKEND_URL is set")]
    MissingBackendKey,
    #[error("invalid backend URL '{value}': {source}")]
    InvalidBackendUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("request timeout must be at least one second")]
    ZeroTimeout,
}

/// Accept secrets that the environment layer parsed as numbers.
///
/// `RSVP_INVITATION_CODE=2026` reaches serde as an integer; leading zeros
/// do not survive that parse, so such codes belong in a config file.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Signed(i64),
        Unsigned(u64),
        Float(f64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Signed(value) => value.to_string(),
        Raw::Unsigned(value) => value.to_string(),
        Raw::Float(value) => value.to_string(),
    }))
}

/// Connection details for the hosted identity and data backend.
pub struct BackendSettings {
    pub base_url: Url,
    pub api_key: Zeroizing<String>,
    pub timeout: Duration,
    pub profile_table: String,
}

/// Configuration values for the portal server.
///
/// Secrets are copied into zeroizing wrappers as soon as they are read.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "RSVP")]
pub struct PortalSettings {
    /// Base URL of the hosted backend; unset selects the in-memory backend.
    pub backend_url: Option<String>,
    /// Public API key sent with every backend request.
    #[serde(default, deserialize_with = "string_or_number")]
    pub backend_key: Option<String>,
    /// Shared secret guests enter to self-register.
    #[serde(default, deserialize_with = "string_or_number")]
    pub invitation_code: Option<String>,
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// Per-request timeout for backend calls, in seconds.
    #[ortho_config(default = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,
    /// Table holding guest profile rows.
    pub profile_table: Option<String>,
}

impl PortalSettings {
    /// Configured invitation code.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MissingInvitationCode`] when unset or blank.
    pub fn invitation_code(&self) -> Result<InvitationCode, SettingsError> {
        match self.invitation_code.as_deref() {
            Some(code) if !code.trim().is_empty() => Ok(InvitationCode::new(code)),
            _ => Err(SettingsError::MissingInvitationCode),
        }
    }

    /// Address to bind, falling back to `0.0.0.0:8080`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidBindAddr`] for a malformed address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value
            .parse()
            .map_err(|source| SettingsError::InvalidBindAddr {
                value: value.to_owned(),
                source,
            })
    }

    /// Backend request timeout; 60 seconds unless configured.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::ZeroTimeout`] when configured as zero.
    pub fn request_timeout(&self) -> Result<Duration, SettingsError> {
        match self.request_timeout_secs {
            0 => Err(SettingsError::ZeroTimeout),
            secs => Ok(Duration::from_secs(secs)),
        }
    }

    /// Profile table name, falling back to `guests`.
    pub fn profile_table(&self) -> &str {
        self.profile_table
            .as_deref()
            .unwrap_or(DEFAULT_PROFILE_TABLE)
    }

    /// Hosted backend connection, or `None` for the in-memory backend.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the URL is malformed, the key is
    /// missing, or the timeout is zero.
    pub fn backend(&self) -> Result<Option<BackendSettings>, SettingsError> {
        let Some(raw_url) = self.backend_url.as_deref() else {
            return Ok(None);
        };
        // `Url::join` drops the last segment unless the base ends in a slash.
        let normalised = if raw_url.ends_with('/') {
            raw_url.to_owned()
        } else {
            format!("{raw_url}/")
        };
        let base_url =
            Url::parse(&normalised).map_err(|source| SettingsError::InvalidBackendUrl {
                value: raw_url.to_owned(),
                source,
            })?;
        let api_key = self
            .backend_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .map(|key| Zeroizing::new(key.to_owned()))
            .ok_or(SettingsError::MissingBackendKey)?;
        Ok(Some(BackendSettings {
            base_url,
            api_key,
            timeout: self.request_timeout()?,
            profile_table: self.profile_table().to_owned(),
        }))
    }
}

impl fmt::Debug for PortalSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalSettings")
            .field("backend_url", &self.backend_url)
            .field("backend_key", &self.backend_key.as_ref().map(|_| "<redacted>"))
            .field(
                "invitation_code",
                &self.invitation_code.as_ref().map(|_| "<redacted>"),
            )
            .field("bind_addr", &self.bind_addr)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("profile_table", &self.profile_table)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for portal configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 6] = [
        "RSVP_BACKEND_URL",
        "RSVP_BACKEND_KEY",
        "RSVP_INVITATION_CODE",
        "RSVP_BIND_ADDR",
        "RSVP_REQUEST_TIMEOUT_SECS",
        "RSVP_PROFILE_TABLE",
    ];

    fn load_with(overrides: &[(&str, &str)]) -> PortalSettings {
        let _guard = lock_env(VARS.map(|name| {
            let value = overrides
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_owned());
            (name, value)
        }));
        PortalSettings::load_from_iter([OsString::from("wedding-rsvp")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_select_the_in_memory_backend() {
        let settings = load_with(&[("RSVP_INVITATION_CODE", "2026")]);
        assert!(settings.backend().expect("valid settings").is_none());
        assert_eq!(
            settings.bind_addr().expect("default address"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("literal address")
        );
        assert_eq!(
            settings.request_timeout().expect("default timeout"),
            Duration::from_secs(60)
        );
        assert_eq!(settings.profile_table(), "guests");
        assert!(settings.invitation_code().expect("code").matches("2026"));
    }

    #[rstest]
    #[case(&[])]
    #[case(&[("RSVP_INVITATION_CODE", "   ")])]
    fn invitation_code_is_required(#[case] overrides: &[(&str, &str)]) {
        let settings = load_with(overrides);
        assert!(matches!(
            settings.invitation_code(),
            Err(SettingsError::MissingInvitationCode)
        ));
    }

    #[rstest]
    #[case(serde_json::json!(2026), "2026")]
    #[case(serde_json::json!(-7), "-7")]
    #[case(serde_json::json!("0042"), "0042")]
    fn numeric_secrets_are_read_as_text(#[case] raw: serde_json::Value, #[case] expected: &str) {
        let settings: PortalSettings = serde_json::from_value(serde_json::json!({
            "invitation_code": raw,
            "backend_key": 12345,
            "request_timeout_secs": 60,
        }))
        .expect("settings deserialise");
        assert!(settings.invitation_code().expect("code").matches(expected));
        assert_eq!(settings.backend_key.as_deref(), Some("12345"));
    }

    #[rstest]
    fn unset_environment_still_loads() {
        let settings = load_with(&[]);
        assert!(settings.invitation_code.is_none());
        assert_eq!(settings.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[rstest]
    fn environment_configures_the_hosted_backend() {
        let settings = load_with(&[
            ("RSVP_BACKEND_URL", "https://example.supabase.co"),
            ("RSVP_BACKEND_KEY", "anon-key"),
            ("RSVP_INVITATION_CODE", "2026"),
            ("RSVP_REQUEST_TIMEOUT_SECS", "5"),
            ("RSVP_PROFILE_TABLE", "wedding_guests"),
        ]);
        let backend = settings
            .backend()
            .expect("valid settings")
            .expect("hosted backend");
        assert_eq!(backend.base_url.as_str(), "https://example.supabase.co/");
        assert_eq!(backend.api_key.as_str(), "anon-key");
        assert_eq!(backend.timeout, Duration::from_secs(5));
        assert_eq!(backend.profile_table, "wedding_guests");
    }

    #[rstest]
    fn hosted_backend_requires_a_key() {
        let settings = load_with(&[
            ("RSVP_BACKEND_URL", "https://example.supabase.co"),
            ("RSVP_INVITATION_CODE", "2026"),
        ]);
        assert!(matches!(
            settings.backend(),
            Err(SettingsError::MissingBackendKey)
        ));
    }

    #[rstest]
    fn malformed_bind_address_is_reported() {
        let settings = load_with(&[("RSVP_BIND_ADDR", "localhost")]);
        assert!(matches!(
            settings.bind_addr(),
            Err(SettingsError::InvalidBindAddr { .. })
        ));
    }

    #[rstest]
    fn zero_timeout_is_reported() {
        let settings = load_with(&[("RSVP_REQUEST_TIMEOUT_SECS", "0")]);
        assert!(matches!(
            settings.request_timeout(),
            Err(SettingsError::ZeroTimeout)
        ));
    }

    #[rstest]
    fn debug_output_redacts_secrets() {
        let settings = load_with(&[
            ("RSVP_BACKEND_KEY", "anon-key"),
            ("RSVP_INVITATION_CODE", "2026"),
        ]);
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("anon-key"));
        assert!(!rendered.contains("2026"));
    }
}
