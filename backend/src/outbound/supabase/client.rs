//! Shared reqwest client and transport helpers for the Supabase adapter.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Url};
use zeroize::Zeroizing;

use super::dto::BackendErrorDto;

/// Connection settings for one Supabase project.
pub struct SupabaseConfig {
    /// Project base URL, e.g. `https://abc.supabase.co`.
    pub base_url: Url,
    /// Anonymous (public) API key.
    pub api_key: Zeroizing<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Table holding one row per guest.
    pub profile_table: String,
}

/// Adapter implementing [`IdentityBackend`](crate::domain::ports::IdentityBackend)
/// and [`GuestDirectory`](crate::domain::ports::GuestDirectory).
pub struct SupabaseClient {
    client: Client,
    base_url: Url,
    api_key: Zeroizing<String>,
    profile_table: String,
}

impl SupabaseClient {
    /// Build the adapter with a reqwest client bound to `config.timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: SupabaseConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url,
            api_key: config.api_key,
            profile_table: config.profile_table,
        })
    }

    pub(super) fn profile_table(&self) -> &str {
        self.profile_table.as_str()
    }

    /// Resolve a path relative to the project root.
    pub(super) fn endpoint(&self, path: &str) -> Result<Url, String> {
        self.base_url
            .join(path)
            .map_err(|error| format!("invalid endpoint {path}: {error}"))
    }

    /// Start a request carrying the API key, authorised as `bearer` when
    /// present and as the anonymous key otherwise.
    pub(super) fn request(&self, method: Method, url: Url, bearer: Option<&str>) -> RequestBuilder {
        let token = bearer.unwrap_or(self.api_key.as_str());
        self.client
            .request(method, url)
            .header("apikey", self.api_key.as_str())
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json")
    }
}

/// Human-readable failure text from an error body, falling back to the
/// status and a compact preview.
pub(super) fn failure_message(status: reqwest::StatusCode, body: &[u8]) -> String {
    if let Some(message) = serde_json::from_slice::<BackendErrorDto>(body)
        .ok()
        .and_then(BackendErrorDto::into_message)
    {
        return message;
    }
    let preview = body_preview(body);
    if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), preview)
    }
}

pub(super) fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
