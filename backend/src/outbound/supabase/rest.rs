//! PostgREST guest table behind the [`GuestDirectory`] port.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use tracing::debug;

use super::client::{SupabaseClient, failure_message};
use super::dto::{GuestRowDto, GuestUpdateDto};
use crate::domain::ports::{GuestDirectory, GuestDirectoryError};
use crate::domain::{AuthSession, GuestProfile, RsvpUpdate};

fn own_row_filter(session: &AuthSession) -> String {
    format!("eq.{}", session.identity().id())
}

impl SupabaseClient {
    fn table_request(
        &self,
        method: Method,
        session: &AuthSession,
    ) -> Result<RequestBuilder, GuestDirectoryError> {
        let url = self
            .endpoint(&format!("rest/v1/{}", self.profile_table()))
            .map_err(GuestDirectoryError::rejected)?;
        Ok(self
            .request(method, url, Some(session.access_token().expose()))
            .query(&[("id", own_row_filter(session))]))
    }

    fn fetch_request(&self, session: &AuthSession) -> Result<RequestBuilder, GuestDirectoryError> {
        Ok(self
            .table_request(Method::GET, session)?
            .query(&[("select", "*")]))
    }

    fn update_request(
        &self,
        session: &AuthSession,
        update: &RsvpUpdate,
    ) -> Result<RequestBuilder, GuestDirectoryError> {
        Ok(self
            .table_request(Method::PATCH, session)?
            .header("Prefer", "return=minimal")
            .json(&GuestUpdateDto::from(update)))
    }
}

#[async_trait]
impl GuestDirectory for SupabaseClient {
    async fn fetch_own_profile(
        &self,
        session: &AuthSession,
    ) -> Result<Option<GuestProfile>, GuestDirectoryError> {
        let response = self
            .fetch_request(session)?
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_rows(body.as_ref())
    }

    async fn update_own_profile(
        &self,
        session: &AuthSession,
        update: &RsvpUpdate,
    ) -> Result<(), GuestDirectoryError> {
        let response = self
            .update_request(session, update)?
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        debug!(status = status.as_u16(), "guest row update completed");
        if !status.is_success() {
            let body = response.bytes().await.map_err(map_transport_error)?;
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(())
    }
}

fn parse_rows(body: &[u8]) -> Result<Option<GuestProfile>, GuestDirectoryError> {
    let rows: Vec<GuestRowDto> = serde_json::from_slice(body).map_err(|error| {
        GuestDirectoryError::decode(format!("invalid guest rows payload: {error}"))
    })?;
    rows.into_iter()
        .next()
        .map(GuestRowDto::into_domain)
        .transpose()
        .map_err(GuestDirectoryError::decode)
}

fn map_transport_error(error: reqwest::Error) -> GuestDirectoryError {
    if error.is_timeout() {
        GuestDirectoryError::timeout(error.to_string())
    } else {
        GuestDirectoryError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> GuestDirectoryError {
    let message = failure_message(status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GuestDirectoryError::unauthorized(message)
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            GuestDirectoryError::timeout(message)
        }
        _ if status.is_client_error() => GuestDirectoryError::rejected(message),
        _ => GuestDirectoryError::transport(message),
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network REST helpers.

    use std::time::Duration;

    use super::*;
    use crate::domain::{AccessToken, AttendanceStatus, Email, Identity, UserId};
    use crate::outbound::supabase::SupabaseConfig;
    use reqwest::Url;
    use rstest::{fixture, rstest};
    use zeroize::Zeroizing;

    const USER_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

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

    #[fixture]
    fn session() -> AuthSession {
        AuthSession::new(
            Identity::new(
                UserId::new(USER_ID).expect("id"),
                Email::new("a@x.com").expect("email"),
                None,
            ),
            AccessToken::new("jwt"),
        )
    }

    fn query(request: &reqwest::Request) -> Vec<(String, String)> {
        request
            .url()
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    fn header<'a>(request: &'a reqwest::Request, name: &str) -> Option<&'a str> {
        request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    }

    #[rstest]
    fn filter_targets_the_session_identity(session: AuthSession) {
        assert_eq!(own_row_filter(&session), format!("eq.{USER_ID}"));
    }

    #[rstest]
    fn fetch_selects_only_the_own_row(client: SupabaseClient, session: AuthSession) {
        let request = client
            .fetch_request(&session)
            .expect("request")
            .build()
            .expect("builds");
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.url().path(), "/rest/v1/guests");
        assert_eq!(
            query(&request),
            vec![
                ("id".to_owned(), format!("eq.{USER_ID}")),
                ("select".to_owned(), "*".to_owned()),
            ]
        );
        assert_eq!(header(&request, "apikey"), Some("anon-key"));
        assert_eq!(header(&request, "authorization"), Some("Bearer jwt"));
        assert_eq!(header(&request, "accept"), Some("application/json"));
    }

    #[rstest]
    fn update_patches_only_the_own_row(client: SupabaseClient, session: AuthSession) {
        let update = RsvpUpdate {
            attendance_status: AttendanceStatus::Attending,
            food_preference: "vegan".into(),
        };
        let request = client
            .update_request(&session, &update)
            .expect("request")
            .build()
            .expect("builds");
        assert_eq!(request.method(), &Method::PATCH);
        assert_eq!(
            query(&request),
            vec![("id".to_owned(), format!("eq.{USER_ID}"))]
        );
        assert_eq!(header(&request, "authorization"), Some("Bearer jwt"));
        assert_eq!(header(&request, "prefer"), Some("return=minimal"));

        let body = request
            .body()
            .and_then(reqwest::Body::as_bytes)
            .expect("buffered body");
        let body: serde_json::Value = serde_json::from_slice(body).expect("json body");
        assert_eq!(
            body,
            serde_json::json!({ "attendance_status": "Я приду", "food_preference": "vegan" })
        );
    }

    #[rstest]
    fn empty_result_means_no_row() {
        assert_eq!(parse_rows(b"[]").expect("decodes"), None);
    }

    #[rstest]
    fn first_row_is_used() {
        let body = r#"[{
            "id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "full_name": "Test",
            "attendance_status": "Не смогу",
            "food_preference": "vegan"
        }]"#;
        let profile = parse_rows(body.as_bytes())
            .expect("decodes")
            .expect("row present");
        assert_eq!(profile.full_name.as_deref(), Some("Test"));
        assert_eq!(profile.attendance_status, AttendanceStatus::NotAttending);
    }

    #[rstest]
    #[case(br#"{"rows":[]}"#.as_slice())]
    #[case(br#"[{"id":"not-a-uuid"}]"#.as_slice())]
    fn malformed_rows_map_to_decode(#[case] body: &[u8]) {
        let error = parse_rows(body).expect_err("decode fails");
        assert!(matches!(error, GuestDirectoryError::Decode { .. }));
    }

    #[rstest]
    #[case(StatusCode::UNAUTHORIZED, "Unauthorized")]
    #[case(StatusCode::NOT_FOUND, "Rejected")]
    #[case(StatusCode::GATEWAY_TIMEOUT, "Timeout")]
    #[case(StatusCode::SERVICE_UNAVAILABLE, "Transport")]
    fn maps_statuses(#[case] status: StatusCode, #[case] expected: &str) {
        let error = map_status_error(status, br#"{"message":"JWT expired"}"#);
        let matched = match expected {
            "Unauthorized" => matches!(error, GuestDirectoryError::Unauthorized { .. }),
            "Rejected" => matches!(error, GuestDirectoryError::Rejected { .. }),
            "Timeout" => matches!(error, GuestDirectoryError::Timeout { .. }),
            "Transport" => matches!(error, GuestDirectoryError::Transport { .. }),
            _ => panic!("unsupported test expectation: {expected}"),
        };
        assert!(matched, "{status} should map to {expected}, got {error:?}");
    }
}
