//! Shared HTTP client and bearer header helpers.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use strum::Display;

use crate::error::FplError;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared client used for API reads.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    })
}

/// Header that carries the bearer credential.
///
/// Most endpoints read `Authorization`; the account family (`/me/`) only
/// honours `X-API-Authorization`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum AuthScheme {
    #[strum(serialize = "Authorization")]
    Authorization,
    #[strum(serialize = "X-API-Authorization")]
    XApiAuthorization,
}

impl AuthScheme {
    fn header_name(self) -> &'static str {
        match self {
            Self::Authorization => "authorization",
            Self::XApiAuthorization => "x-api-authorization",
        }
    }
}

/// Build JSON headers carrying `Bearer <token>` under `scheme`.
pub fn bearer_headers(token: &str, scheme: AuthScheme) -> Result<HeaderMap, FplError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|_| FplError::InvalidArgument("access token is not a valid header value".into()))?;
    value.set_sensitive(true);
    headers.insert(scheme.header_name(), value);
    Ok(headers)
}

/// Map a non-success status to an error.
pub fn status_to_error(status: u16, body: &str) -> FplError {
    match status {
        401 | 403 => FplError::Authentication(body.to_string()),
        _ => FplError::api(status, body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x_api_variant_uses_its_own_header() {
        let headers = bearer_headers("A1", AuthScheme::XApiAuthorization).unwrap();
        assert_eq!(headers.get("x-api-authorization").unwrap(), "Bearer A1");
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn default_variant_uses_authorization() {
        let headers = bearer_headers("A1", AuthScheme::Authorization).unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer A1");
        assert!(headers.get(AUTHORIZATION).unwrap().is_sensitive());
    }

    #[test]
    fn newline_in_token_is_rejected() {
        assert!(matches!(
            bearer_headers("A1\nX", AuthScheme::Authorization),
            Err(FplError::InvalidArgument(_))
        ));
    }

    #[test]
    fn unauthorized_maps_to_authentication() {
        assert!(matches!(
            status_to_error(401, "nope"),
            FplError::Authentication(_)
        ));
        assert!(matches!(status_to_error(404, "gone"), FplError::Api { status: 404, .. }));
    }
}
