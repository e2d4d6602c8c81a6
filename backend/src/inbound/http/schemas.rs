//! OpenAPI schema definitions for domain types.
//!
//! Domain types stay free of utoipa derives. The wrappers here mirror their
//! serialised shape and are registered under the domain type names.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Authentication failed or is missing.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The action does not apply to the current portal state.
    #[schema(rename = "conflict")]
    Conflict,
    /// The identity or data backend could not be reached.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = Error, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "Invalid invitation code!")]
    message: String,
    /// Correlation identifier for tracing this error across systems.
    #[schema(example = "01HZY8B2W6X5Y7Z9ABCD1234")]
    trace_id: Option<String>,
    /// Rule and field that failed, for validation errors.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::NoticeLevel`].
#[derive(ToSchema)]
#[schema(as = NoticeLevel)]
pub enum NoticeLevelSchema {
    #[schema(rename = "success")]
    Success,
    #[schema(rename = "info")]
    Info,
    #[schema(rename = "error")]
    Error,
}

/// OpenAPI schema for [`crate::domain::Notice`].
#[derive(ToSchema)]
#[schema(as = Notice)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct NoticeSchema {
    level: NoticeLevelSchema,
    #[schema(example = "Your answer has been saved!")]
    text: String,
}

/// OpenAPI schema for [`crate::inbound::http::portal::PortalResponse`].
///
/// `view` is a tagged union on `kind` (`anonymous` or `authenticated`).
#[derive(ToSchema)]
#[schema(as = PortalResponse)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct PortalResponseSchema {
    /// Rendered view tree for the caller's state.
    view: serde_json::Value,
    /// Message produced by the action, if any.
    notice: Option<NoticeSchema>,
}
