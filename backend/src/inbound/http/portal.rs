//! Portal API handlers.
//!
//! ```text
//! GET  /api/v1/portal
//! POST /api/v1/portal/sign-in {"email":"a@x.com","password":"hunter2"}
//! PUT  /api/v1/portal/rsvp {"attendanceStatus":"attending","foodPreference":"fish"}
//! ```
//!
//! Every handler loads the caller's state from the session cookie, runs one
//! portal action and, on success, persists the new state before rendering
//! it. A failed action leaves the cookie untouched. Loading the page also
//! stores renewed tokens, or clears a session the backend no longer accepts.

use actix_web::{get, post, put, web};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{GuestPortal, Resumed, Transition};
use crate::domain::{
    AttendanceStatus, LoginCredentials, Notice, PasswordChange, PortalView, Registration,
    RsvpUpdate, validation_error,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{ErrorSchema, PortalResponseSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// View plus the message produced by the action that led to it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalResponse {
    pub view: PortalView,
    pub notice: Option<Notice>,
}

/// Request body for `POST /api/v1/portal/sign-in`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /api/v1/portal/register`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub invitation_code: String,
}

/// Request body for `POST /api/v1/portal/recovery/request`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryRequest {
    pub email: String,
}

/// Request body for `POST /api/v1/portal/recovery/verify`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[schema(example = "123456")]
    pub code: String,
}

/// Request body for `PUT /api/v1/portal/rsvp`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RsvpRequest {
    #[schema(value_type = String, example = "attending")]
    pub attendance_status: AttendanceStatus,
    #[serde(default)]
    pub food_preference: String,
}

impl From<RsvpRequest> for RsvpUpdate {
    fn from(value: RsvpRequest) -> Self {
        Self {
            attendance_status: value.attendance_status,
            food_preference: value.food_preference,
        }
    }
}

/// Request body for `POST /api/v1/portal/password`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PasswordRequest {
    pub new_password: String,
    pub confirm_password: String,
}

async fn respond(
    portal: &dyn GuestPortal,
    session: &SessionContext,
    transition: Transition,
) -> ApiResult<web::Json<PortalResponse>> {
    session.persist(&transition.state)?;
    let view = portal.view(&transition.state).await;
    Ok(web::Json(PortalResponse {
        view,
        notice: transition.notice,
    }))
}

/// Render the caller's current view, renewing an expiring session.
#[utoipa::path(
    get,
    path = "/api/v1/portal",
    responses(
        (status = 200, description = "Current view", body = PortalResponseSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["portal"],
    operation_id = "getPortal",
    security([])
)]
#[get("/portal")]
pub async fn get_portal(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<PortalResponse>> {
    let current = session.state();
    let Resumed { transition, view } = state.portal.resume(&current).await;
    if transition.state != current {
        session.persist(&transition.state)?;
    }
    Ok(web::Json(PortalResponse {
        view,
        notice: transition.notice,
    }))
}

/// Sign in with email and password.
#[utoipa::path(
    post,
    path = "/api/v1/portal/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = PortalResponseSchema, headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 409, description = "Already signed in", body = ErrorSchema),
        (status = 503, description = "Backend unavailable", body = ErrorSchema)
    ),
    tags = ["portal"],
    operation_id = "signIn",
    security([])
)]
#[post("/portal/sign-in")]
pub async fn sign_in(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignInRequest>,
) -> ApiResult<web::Json<PortalResponse>> {
    let SignInRequest { email, password } = payload.into_inner();
    let credentials =
        LoginCredentials::try_from_parts(&email, &password).map_err(|err| validation_error(&err))?;
    let transition = state.portal.sign_in(&session.state(), credentials).await?;
    respond(state.portal.as_ref(), &session, transition).await
}

/// Create an account with the shared invitation code.
///
/// Registration does not sign the guest in.
#[utoipa::path(
    post,
    path = "/api/v1/portal/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = PortalResponseSchema),
        (status = 400, description = "Invalid request or invitation code", body = ErrorSchema),
        (status = 409, description = "Already signed in", body = ErrorSchema),
        (status = 503, description = "Backend unavailable", body = ErrorSchema)
    ),
    tags = ["portal"],
    operation_id = "register",
    security([])
)]
#[post("/portal/register")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<web::Json<PortalResponse>> {
    let RegisterRequest {
        full_name,
        email,
        password,
        invitation_code,
    } = payload.into_inner();
    let registration = Registration::try_from_parts(&full_name, &email, &password)
        .map_err(|err| validation_error(&err))?;
    let transition = state
        .portal
        .register(&session.state(), registration, invitation_code)
        .await?;
    respond(state.portal.as_ref(), &session, transition).await
}

/// Send a one-time sign-in code to an existing account.
#[utoipa::path(
    post,
    path = "/api/v1/portal/recovery/request",
    request_body = RecoveryRequest,
    responses(
        (status = 200, description = "Code sent", body = PortalResponseSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Code already pending or signed in", body = ErrorSchema),
        (status = 503, description = "Backend unavailable", body = ErrorSchema)
    ),
    tags = ["portal"],
    operation_id = "requestCode",
    security([])
)]
#[post("/portal/recovery/request")]
pub async fn request_code(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RecoveryRequest>,
) -> ApiResult<web::Json<PortalResponse>> {
    let transition = state
        .portal
        .request_code(&session.state(), payload.into_inner().email)
        .await?;
    respond(state.portal.as_ref(), &session, transition).await
}

/// Verify the code sent to the pending email.
#[utoipa::path(
    post,
    path = "/api/v1/portal/recovery/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Signed in", body = PortalResponseSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Wrong or expired code", body = ErrorSchema),
        (status = 409, description = "No code pending", body = ErrorSchema),
        (status = 503, description = "Backend unavailable", body = ErrorSchema)
    ),
    tags = ["portal"],
    operation_id = "verifyCode",
    security([])
)]
#[post("/portal/recovery/verify")]
pub async fn verify_code(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<VerifyRequest>,
) -> ApiResult<web::Json<PortalResponse>> {
    let transition = state
        .portal
        .verify_code(&session.state(), payload.into_inner().code)
        .await?;
    respond(state.portal.as_ref(), &session, transition).await
}

/// Abandon the pending code and enter a different email.
#[utoipa::path(
    post,
    path = "/api/v1/portal/recovery/cancel",
    responses(
        (status = 200, description = "Recovery cancelled", body = PortalResponseSchema),
        (status = 409, description = "Signed in", body = ErrorSchema)
    ),
    tags = ["portal"],
    operation_id = "cancelRecovery",
    security([])
)]
#[post("/portal/recovery/cancel")]
pub async fn cancel_recovery(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<PortalResponse>> {
    let transition = state.portal.cancel_recovery(&session.state()).await?;
    respond(state.portal.as_ref(), &session, transition).await
}

/// Save the guest's RSVP answer.
#[utoipa::path(
    put,
    path = "/api/v1/portal/rsvp",
    request_body = RsvpRequest,
    responses(
        (status = 200, description = "Answer saved", body = PortalResponseSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 503, description = "Backend unavailable", body = ErrorSchema)
    ),
    tags = ["portal"],
    operation_id = "updateRsvp"
)]
#[put("/portal/rsvp")]
pub async fn update_rsvp(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RsvpRequest>,
) -> ApiResult<web::Json<PortalResponse>> {
    let transition = state
        .portal
        .update_rsvp(&session.state(), payload.into_inner().into())
        .await?;
    respond(state.portal.as_ref(), &session, transition).await
}

/// Change the signed-in guest's password.
#[utoipa::path(
    post,
    path = "/api/v1/portal/password",
    request_body = PasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = PortalResponseSchema),
        (status = 400, description = "Mismatch or too short", body = ErrorSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema),
        (status = 503, description = "Backend unavailable", body = ErrorSchema)
    ),
    tags = ["portal"],
    operation_id = "changePassword"
)]
#[post("/portal/password")]
pub async fn change_password(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<PasswordRequest>,
) -> ApiResult<web::Json<PortalResponse>> {
    let PasswordRequest {
        new_password,
        confirm_password,
    } = payload.into_inner();
    let change = PasswordChange::try_from_parts(&new_password, &confirm_password)
        .map_err(|err| validation_error(&err))?;
    let transition = state
        .portal
        .change_password(&session.state(), change)
        .await?;
    respond(state.portal.as_ref(), &session, transition).await
}

/// Sign out; the local session is cleared even if the backend call fails.
#[utoipa::path(
    post,
    path = "/api/v1/portal/sign-out",
    responses(
        (status = 200, description = "Signed out", body = PortalResponseSchema),
        (status = 401, description = "Not signed in", body = ErrorSchema)
    ),
    tags = ["portal"],
    operation_id = "signOut"
)]
#[post("/portal/sign-out")]
pub async fn sign_out(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<PortalResponse>> {
    let transition = state.portal.sign_out(&session.state()).await?;
    respond(state.portal.as_ref(), &session, transition).await
}

/// Register every portal handler on `cfg`; mount inside the `/api/v1` scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_portal)
        .service(sign_in)
        .service(register)
        .service(request_code)
        .service(verify_code)
        .service(cancel_recovery)
        .service(update_rsvp)
        .service(change_password)
        .service(sign_out);
}

#[cfg(test)]
#[path = "portal_tests.rs"]
mod tests;
