//! Portal entry-point: loads configuration, wires the backend adapter and
//! serves the REST endpoints.

mod server;

use std::ffi::OsString;

use actix_web::web;
use color_eyre::eyre::WrapErr;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{ServerConfig, create_server};
use wedding_rsvp::inbound::http::health::HealthState;
use wedding_rsvp::inbound::http::session_config::{BuildMode, session_settings_from_env};
use wedding_rsvp::settings::PortalSettings;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = PortalSettings::load_from_iter(std::env::args_os().collect::<Vec<OsString>>())
        .wrap_err("failed to load portal settings")?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("invalid session cookie configuration")?;
    let bind_addr = settings.bind_addr()?;
    let config = ServerConfig::new(
        session.key,
        session.cookie_secure,
        session.same_site,
        bind_addr,
        settings.invitation_code()?,
    )
    .with_backend(settings.backend()?);

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config).wrap_err("failed to start server")?;
    info!(%bind_addr, "portal listening");
    server.await.wrap_err("server terminated with an error")
}
