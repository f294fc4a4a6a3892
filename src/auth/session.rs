//! Cookie-preserving HTTP session scoped to one handshake attempt.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::redirect::Policy;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use super::error::AuthError;
use super::state::HandshakeStep;
use crate::util::timeout::with_timeout;

/// Longest response body excerpt kept in a [`AuthError::Status`].
const ERROR_BODY_LIMIT: usize = 512;

/// Two clients over one cookie jar: the default one follows redirects, the
/// other hands back raw 3xx responses so `Location` stays observable.
///
/// A session is owned by exactly one handshake and dropped with it.
#[derive(Debug)]
pub struct SessionContext {
    jar: Arc<Jar>,
    client: reqwest::Client,
    no_redirect: reqwest::Client,
    step_timeout: Duration,
}

impl SessionContext {
    pub fn new(user_agent: &str, step_timeout: Duration) -> Result<Self, AuthError> {
        let jar = Arc::new(Jar::default());
        let build = |policy: Policy| {
            reqwest::Client::builder()
                .cookie_provider(Arc::clone(&jar))
                .user_agent(user_agent)
                .connect_timeout(step_timeout)
                .redirect(policy)
                .build()
                .map_err(|err| AuthError::Setup {
                    step: HandshakeStep::Session,
                    message: err.to_string(),
                })
        };
        let client = build(Policy::default())?;
        let no_redirect = build(Policy::none())?;
        Ok(Self {
            jar,
            client,
            no_redirect,
            step_timeout,
        })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Client that never follows redirects.
    pub fn without_redirects(&self) -> &reqwest::Client {
        &self.no_redirect
    }

    pub fn cookie_jar(&self) -> &Arc<Jar> {
        &self.jar
    }

    pub fn step_timeout(&self) -> Duration {
        self.step_timeout
    }

    /// Send `request` and read the whole body within the step timeout.
    pub async fn execute(
        &self,
        step: HandshakeStep,
        request: RequestBuilder,
    ) -> Result<StepResponse, AuthError> {
        with_timeout(step, self.step_timeout, async move {
            let response = request
                .send()
                .await
                .map_err(|err| AuthError::transport(step, err))?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response
                .text()
                .await
                .map_err(|err| AuthError::transport(step, err))?;
            Ok(StepResponse {
                status,
                headers,
                body,
            })
        })
        .await
    }
}

/// Fully-read response of one handshake request.
#[derive(Debug)]
pub struct StepResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl StepResponse {
    /// Turn any non-2xx status into [`AuthError::Status`].
    pub fn ensure_success(self, step: HandshakeStep) -> Result<Self, AuthError> {
        if self.status.is_success() {
            return Ok(self);
        }
        Err(AuthError::Status {
            step,
            status: self.status.as_u16(),
            body: truncate(&self.body, ERROR_BODY_LIMIT),
        })
    }

    pub fn json<T: DeserializeOwned>(&self, step: HandshakeStep) -> Result<T, AuthError> {
        serde_json::from_str(&self.body).map_err(|err| AuthError::MalformedBody {
            step,
            message: err.to_string(),
        })
    }

    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }
}

/// Unwrap a response field that the next step depends on.
pub(crate) fn require(
    step: HandshakeStep,
    field: &'static str,
    value: Option<String>,
) -> Result<String, AuthError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AuthError::MissingField { step, field }),
    }
}

fn truncate(body: &str, limit: usize) -> String {
    match body.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}
