//! GoTrue endpoints behind the [`IdentityBackend`] port.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::client::{SupabaseClient, failure_message};
use super::dto::{
    OtpRequestDto, PasswordGrantDto, PasswordUpdateDto, RefreshGrantDto, SessionDto,
    SignUpMetadataDto, SignUpRequestDto, SignUpResponseDto, VerifyRequestDto,
};
use crate::domain::ports::{IdentityBackend, IdentityBackendError, SignUpOutcome};
use crate::domain::{
    AuthSession, Email, LoginCredentials, OneTimeCode, PasswordChange, RefreshToken, Registration,
};

const REFRESH_GRANT_PATH: &str = "auth/v1/token?grant_type=refresh_token";

/// Which call failed; decides how a 4xx status is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthCall {
    SignUp,
    PasswordGrant,
    OtpRequest,
    OtpVerify,
    Refresh,
    BearerCall,
}

impl SupabaseClient {
    fn auth_request<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        bearer: Option<&str>,
        body: Option<&T>,
    ) -> Result<RequestBuilder, IdentityBackendError> {
        let url = self.endpoint(path).map_err(IdentityBackendError::rejected)?;
        let request = self.request(method, url, bearer);
        Ok(match body {
            Some(body) => request.json(body),
            None => request,
        })
    }

    async fn send_auth<T: Serialize + ?Sized>(
        &self,
        call: AuthCall,
        method: Method,
        path: &str,
        bearer: Option<&str>,
        body: Option<&T>,
    ) -> Result<Vec<u8>, IdentityBackendError> {
        let request = self.auth_request(method, path, bearer, body)?;
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        debug!(?call, status = status.as_u16(), "auth call completed");
        if !status.is_success() {
            return Err(map_status_error(call, status, bytes.as_ref()));
        }
        Ok(bytes.to_vec())
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, IdentityBackendError> {
    serde_json::from_slice(body).map_err(|error| {
        IdentityBackendError::decode(format!("invalid auth JSON payload: {error}"))
    })
}

fn decode_session(body: &[u8]) -> Result<AuthSession, IdentityBackendError> {
    decode::<SessionDto>(body)?
        .into_domain(Utc::now())
        .map_err(IdentityBackendError::decode)
}

#[async_trait]
impl IdentityBackend for SupabaseClient {
    async fn create_account(
        &self,
        registration: &Registration,
    ) -> Result<SignUpOutcome, IdentityBackendError> {
        let credentials = registration.credentials();
        let body = SignUpRequestDto {
            email: credentials.email().as_ref(),
            password: credentials.password(),
            data: SignUpMetadataDto {
                full_name: registration.display_name().as_ref(),
            },
        };
        let bytes = self
            .send_auth(
                AuthCall::SignUp,
                Method::POST,
                "auth/v1/signup",
                None,
                Some(&body),
            )
            .await?;
        let response: SignUpResponseDto = decode(&bytes)?;
        if response.user().has_identities() {
            Ok(SignUpOutcome::Created)
        } else {
            Ok(SignUpOutcome::AlreadyRegistered)
        }
    }

    async fn sign_in(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<AuthSession, IdentityBackendError> {
        let body = PasswordGrantDto {
            email: credentials.email().as_ref(),
            password: credentials.password(),
        };
        let bytes = self
            .send_auth(
                AuthCall::PasswordGrant,
                Method::POST,
                "auth/v1/token?grant_type=password",
                None,
                Some(&body),
            )
            .await?;
        decode_session(&bytes)
    }

    async fn request_one_time_code(&self, email: &Email) -> Result<(), IdentityBackendError> {
        let body = OtpRequestDto {
            email: email.as_ref(),
            create_user: false,
        };
        self.send_auth(
            AuthCall::OtpRequest,
            Method::POST,
            "auth/v1/otp",
            None,
            Some(&body),
        )
        .await?;
        Ok(())
    }

    async fn verify_one_time_code(
        &self,
        email: &Email,
        code: &OneTimeCode,
    ) -> Result<AuthSession, IdentityBackendError> {
        let body = VerifyRequestDto {
            kind: "email",
            email: email.as_ref(),
            token: code.as_str(),
        };
        let bytes = self
            .send_auth(
                AuthCall::OtpVerify,
                Method::POST,
                "auth/v1/verify",
                None,
                Some(&body),
            )
            .await?;
        decode_session(&bytes)
    }

    async fn refresh_session(
        &self,
        refresh_token: &RefreshToken,
    ) -> Result<AuthSession, IdentityBackendError> {
        let body = RefreshGrantDto {
            refresh_token: refresh_token.expose(),
        };
        let bytes = self
            .send_auth(
                AuthCall::Refresh,
                Method::POST,
                REFRESH_GRANT_PATH,
                None,
                Some(&body),
            )
            .await?;
        decode_session(&bytes)
    }

    async fn change_password(
        &self,
        session: &AuthSession,
        change: &PasswordChange,
    ) -> Result<(), IdentityBackendError> {
        let body = PasswordUpdateDto {
            password: change.new_password(),
        };
        self.send_auth(
            AuthCall::BearerCall,
            Method::PUT,
            "auth/v1/user",
            Some(session.access_token().expose()),
            Some(&body),
        )
        .await?;
        Ok(())
    }

    async fn sign_out(&self, session: &AuthSession) -> Result<(), IdentityBackendError> {
        self.send_auth::<()>(
            AuthCall::BearerCall,
            Method::POST,
            "auth/v1/logout",
            Some(session.access_token().expose()),
            None,
        )
        .await?;
        Ok(())
    }
}

fn map_transport_error(error: reqwest::Error) -> IdentityBackendError {
    if error.is_timeout() {
        IdentityBackendError::timeout(error.to_string())
    } else {
        IdentityBackendError::transport(error.to_string())
    }
}

fn map_status_error(call: AuthCall, status: StatusCode, body: &[u8]) -> IdentityBackendError {
    let message = failure_message(status, body);
    match (call, status) {
        (_, StatusCode::TOO_MANY_REQUESTS) => IdentityBackendError::rate_limited(message),
        (_, StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT) => {
            IdentityBackendError::timeout(message)
        }
        (AuthCall::PasswordGrant, StatusCode::BAD_REQUEST) => {
            IdentityBackendError::invalid_credentials(message)
        }
        (
            AuthCall::OtpVerify,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN,
        ) => IdentityBackendError::invalid_code(message),
        (
            AuthCall::Refresh,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN,
        )
        | (AuthCall::BearerCall, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
            IdentityBackendError::unauthorized(message)
        }
        _ if status.is_client_error() => IdentityBackendError::rejected(message),
        _ => IdentityBackendError::transport(message),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network auth mapping helpers.

    use std::time::Duration;

    use super::*;
    use crate::outbound::supabase::SupabaseConfig;
    use reqwest::Url;
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};
    use zeroize::Zeroizing;

    #[fixture]
    fn client() -> SupabaseClient {
        SupabaseClient::new(SupabaseConfig {
            base_url: Url::parse("https://abc.supabase.co").expect("base url"),
            api_key: Zeroizing::new("anon-key".into()),
            timeout: Duration::from_secs(5),
            profile_table: "guests".into(),
        })
        .expect("client builds")
    }

    fn header<'a>(request: &'a reqwest::Request, name: &str) -> Option<&'a str> {
        request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    }

    fn json_body(request: &reqwest::Request) -> Value {
        let bytes = request
            .body()
            .and_then(reqwest::Body::as_bytes)
            .expect("buffered body");
        serde_json::from_slice(bytes).expect("json body")
    }

    #[rstest]
    fn anonymous_calls_authorise_with_the_api_key(client: SupabaseClient) {
        let body = PasswordGrantDto {
            email: "a@x.com",
            password: "hunter2",
        };
        let request = client
            .auth_request(
                Method::POST,
                "auth/v1/token?grant_type=password",
                None,
                Some(&body),
            )
            .expect("request")
            .build()
            .expect("builds");
        assert_eq!(request.method(), &Method::POST);
        assert_eq!(
            request.url().as_str(),
            "https://abc.supabase.co/auth/v1/token?grant_type=password"
        );
        assert_eq!(header(&request, "apikey"), Some("anon-key"));
        assert_eq!(header(&request, "authorization"), Some("Bearer anon-key"));
        assert_eq!(
            json_body(&request),
            json!({ "email": "a@x.com", "password": "hunter2" })
        );
    }

    #[rstest]
    fn refresh_posts_the_refresh_token(client: SupabaseClient) {
        let body = RefreshGrantDto {
            refresh_token: "refresh-1",
        };
        let request = client
            .auth_request(Method::POST, REFRESH_GRANT_PATH, None, Some(&body))
            .expect("request")
            .build()
            .expect("builds");
        assert_eq!(request.url().path(), "/auth/v1/token");
        assert_eq!(request.url().query(), Some("grant_type=refresh_token"));
        assert_eq!(json_body(&request), json!({ "refresh_token": "refresh-1" }));
    }

    #[rstest]
    fn user_calls_carry_the_session_token(client: SupabaseClient) {
        let request = client
            .auth_request::<()>(Method::POST, "auth/v1/logout", Some("jwt"), None)
            .expect("request")
            .build()
            .expect("builds");
        assert_eq!(request.url().path(), "/auth/v1/logout");
        assert_eq!(header(&request, "apikey"), Some("anon-key"));
        assert_eq!(header(&request, "authorization"), Some("Bearer jwt"));
        assert!(request.body().is_none());
    }

    const INVALID_LOGIN: &[u8] =
        br#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#;

    #[rstest]
    #[case::wrong_password(AuthCall::PasswordGrant, StatusCode::BAD_REQUEST, "InvalidCredentials")]
    #[case::wrong_code(AuthCall::OtpVerify, StatusCode::FORBIDDEN, "InvalidCode")]
    #[case::expired_token(AuthCall::BearerCall, StatusCode::UNAUTHORIZED, "Unauthorized")]
    #[case::used_refresh_token(AuthCall::Refresh, StatusCode::BAD_REQUEST, "Unauthorized")]
    #[case::throttled(AuthCall::OtpRequest, StatusCode::TOO_MANY_REQUESTS, "RateLimited")]
    #[case::gateway_timeout(AuthCall::SignUp, StatusCode::GATEWAY_TIMEOUT, "Timeout")]
    #[case::weak_password(AuthCall::SignUp, StatusCode::UNPROCESSABLE_ENTITY, "Rejected")]
    #[case::server_error(AuthCall::PasswordGrant, StatusCode::BAD_GATEWAY, "Transport")]
    fn maps_statuses_per_call(
        #[case] call: AuthCall,
        #[case] status: StatusCode,
        #[case] expected: &str,
    ) {
        let error = map_status_error(call, status, INVALID_LOGIN);
        let matched = match expected {
            "InvalidCredentials" => {
                matches!(error, IdentityBackendError::InvalidCredentials { .. })
            }
            "InvalidCode" => matches!(error, IdentityBackendError::InvalidCode { .. }),
            "Unauthorized" => matches!(error, IdentityBackendError::Unauthorized { .. }),
            "RateLimited" => matches!(error, IdentityBackendError::RateLimited { .. }),
            "Timeout" => matches!(error, IdentityBackendError::Timeout { .. }),
            "Rejected" => matches!(error, IdentityBackendError::Rejected { .. }),
            "Transport" => matches!(error, IdentityBackendError::Transport { .. }),
            _ => panic!("unsupported test expectation: {expected}"),
        };
        assert!(
            matched,
            "{status} on {call:?} should map to {expected}, got {error:?}"
        );
    }

    #[rstest]
    fn status_errors_carry_backend_text() {
        let error = map_status_error(
            AuthCall::PasswordGrant,
            StatusCode::BAD_REQUEST,
            INVALID_LOGIN,
        );
        assert_eq!(
            error,
            IdentityBackendError::invalid_credentials("Invalid login credentials")
        );
    }

    #[rstest]
    fn session_decode_failures_map_to_decode() {
        let error = decode_session(br#"{"user":{}}"#).expect_err("missing token");
        assert!(matches!(error, IdentityBackendError::Decode { .. }));
    }
}
