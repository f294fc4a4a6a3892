//! Resume the authorization flow and capture the redirect's code.

use reqwest::Url;
use tracing::debug;

use super::error::AuthError;
use super::login::DeviceResponse;
use super::session::SessionContext;
use super::settings::ProviderEndpoints;
use super::state::HandshakeStep;
use super::token::secret_string;

secret_string!(
    /// Single-use authorization code from the resume redirect.
    AuthorizationCode
);

/// Submit the device response and return the code carried by the redirect.
///
/// Redirects are not followed; the raw `Location` header is inspected.
pub async fn resume_authorization(
    session: &SessionContext,
    endpoints: &ProviderEndpoints,
    device: DeviceResponse,
) -> Result<AuthorizationCode, AuthError> {
    let step = HandshakeStep::Resume;
    let request = session
        .without_redirects()
        .post(&endpoints.resume)
        .form(&[
            ("dvResponse", device.dv_response.as_str()),
            ("state", device.state.as_str()),
        ]);

    let response = session.execute(step, request).await?;
    debug!(status = response.status.as_u16(), "resume responded");

    let Some(location) = response.location() else {
        return Err(AuthError::Rejected {
            step,
            reason: format!(
                "no redirect from resume (status {}); state or dvResponse was not accepted",
                response.status
            ),
        });
    };
    extract_code(location, &endpoints.resume)
}

/// Pull `code` from a redirect target. Relative targets are resolved
/// against `base`; when `code` repeats, the first occurrence wins.
pub fn extract_code(location: &str, base: &str) -> Result<AuthorizationCode, AuthError> {
    let step = HandshakeStep::Resume;
    let url = Url::parse(location)
        .or_else(|_| Url::parse(base).and_then(|base| base.join(location)))
        .map_err(|err| AuthError::Rejected {
            step,
            reason: format!("unparseable redirect target: {err}"),
        })?;

    let mut code = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" if !value.is_empty() => {
                code.get_or_insert_with(|| value.into_owned());
            }
            "error_description" => error = Some(value.into_owned()),
            "error" if error.is_none() => error = Some(value.into_owned()),
            _ => {}
        }
    }

    match (code, error) {
        (Some(code), _) => Ok(AuthorizationCode::new(code)),
        (None, Some(error)) => Err(AuthError::Rejected {
            step,
            reason: format!("provider redirected with error: {error}"),
        }),
        (None, None) => Err(AuthError::Rejected {
            step,
            reason: "redirect carries no authorization code".to_string(),
        }),
    }
}
