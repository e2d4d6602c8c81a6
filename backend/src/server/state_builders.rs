//! Builders wiring the portal service to its backend adapter.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use wedding_rsvp::domain::ports::{GuestDirectory, IdentityBackend};
use wedding_rsvp::domain::{GuestPortalService, InvitationCode};
use wedding_rsvp::inbound::http::state::HttpState;
use wedding_rsvp::outbound::memory::InMemoryBackend;
use wedding_rsvp::outbound::supabase::{SupabaseClient, SupabaseConfig};
use wedding_rsvp::settings::BackendSettings;

use super::ServerConfig;

/// Wrap one adapter serving both driven ports in a portal service.
fn portal_state<A>(adapter: Arc<A>, invitation_code: InvitationCode) -> HttpState
where
    A: IdentityBackend + GuestDirectory + 'static,
{
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let portal = GuestPortalService::new(adapter.clone(), adapter, invitation_code, clock);
    HttpState::new(Arc::new(portal))
}

fn supabase_client(backend: &BackendSettings) -> std::io::Result<SupabaseClient> {
    SupabaseClient::new(SupabaseConfig {
        base_url: backend.base_url.clone(),
        api_key: backend.api_key.clone(),
        timeout: backend.timeout,
        profile_table: backend.profile_table.clone(),
    })
    .map_err(|err| std::io::Error::other(format!("backend client construction failed: {err}")))
}

/// Build handler state for the configured backend.
///
/// # Errors
/// Returns [`std::io::Error`] when the HTTP client cannot be constructed.
pub(crate) fn build_http_state(config: &ServerConfig) -> std::io::Result<HttpState> {
    let invitation_code = config.invitation_code.clone();
    match &config.backend {
        Some(backend) => {
            info!(
                base_url = %backend.base_url,
                profile_table = %backend.profile_table,
                "using hosted backend"
            );
            Ok(portal_state(
                Arc::new(supabase_client(backend)?),
                invitation_code,
            ))
        }
        None => {
            warn!("no backend URL configured; using in-memory development backend");
            Ok(portal_state(Arc::new(InMemoryBackend::new()), invitation_code))
        }
    }
}
