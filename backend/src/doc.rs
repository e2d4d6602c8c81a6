//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers the portal endpoints, the health probes and the
//! schema wrappers from [`crate::inbound::http::schemas`], plus the session
//! cookie security scheme. Swagger UI serves it in debug builds and
//! `cargo run --bin openapi-dump` prints it for external tooling.

use crate::inbound::http::portal::{
    PasswordRequest, RecoveryRequest, RegisterRequest, RsvpRequest, SignInRequest, VerifyRequest,
};
use crate::inbound::http::schemas::{
    ErrorCodeSchema, ErrorSchema, NoticeLevelSchema, NoticeSchema, PortalResponseSchema,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Encrypted session cookie issued by the sign-in and code verification endpoints.",
            ))),
        );
    }
}

/// OpenAPI document for the portal API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Wedding RSVP portal API",
        description = "Guest sign-in, registration, one-time code recovery, RSVP answers and health probes."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::portal::get_portal,
        crate::inbound::http::portal::sign_in,
        crate::inbound::http::portal::register,
        crate::inbound::http::portal::request_code,
        crate::inbound::http::portal::verify_code,
        crate::inbound::http::portal::cancel_recovery,
        crate::inbound::http::portal::update_rsvp,
        crate::inbound::http::portal::change_password,
        crate::inbound::http::portal::sign_out,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        NoticeSchema,
        NoticeLevelSchema,
        PortalResponseSchema,
        SignInRequest,
        RegisterRequest,
        RecoveryRequest,
        VerifyRequest,
        RsvpRequest,
        PasswordRequest,
    )),
    tags(
        (name = "portal", description = "Guest portal actions"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
