//! Authorization page fetch and the HTML page contract.
//!
//! The provider's login page embeds two values the rest of the handshake
//! depends on: a quoted `"accessToken"` field (the bootstrap token) and a
//! hidden `<input name="state">` echoed back at resume. Both are scraped
//! here and nowhere else.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use super::error::AuthError;
use super::pkce::InitialState;
use super::session::SessionContext;
use super::settings::HandshakeSettings;
use super::state::HandshakeStep;
use super::token::BootstrapToken;

/// The login page no longer matches the shape the handshake relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageContractError {
    #[error("authorization page has no quoted accessToken field")]
    MissingBootstrapToken,
    #[error("authorization page has no hidden state input")]
    MissingStateInput,
}

/// `state` value scraped from the login page, replayed verbatim at resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumedState(String);

impl ResumedState {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Values scraped from the authorization page.
#[derive(Debug)]
pub struct AuthorizationPage {
    pub bootstrap_token: BootstrapToken,
    pub resumed_state: ResumedState,
}

impl AuthorizationPage {
    /// Parse a login page body against the page contract.
    pub fn parse(html: &str) -> Result<Self, PageContractError> {
        let bootstrap_token = access_token_re()
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| BootstrapToken::new(m.as_str()))
            .ok_or(PageContractError::MissingBootstrapToken)?;

        let resumed_state = state_input_re()
            .captures(html)
            .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|m| ResumedState::new(m.as_str()))
            .ok_or(PageContractError::MissingStateInput)?;

        Ok(Self {
            bootstrap_token,
            resumed_state,
        })
    }
}

/// Request the authorization page and scrape it.
pub async fn fetch_authorization_page(
    session: &SessionContext,
    settings: &HandshakeSettings,
    code_challenge: &str,
    initial_state: &InitialState,
) -> Result<AuthorizationPage, AuthError> {
    let step = HandshakeStep::Authorize;
    let request = session.client().get(&settings.endpoints.authorize).query(&[
        ("client_id", settings.client_id.as_str()),
        ("redirect_uri", settings.redirect_uri.as_str()),
        ("response_type", "code"),
        ("scope", settings.scope.as_str()),
        ("state", initial_state.as_str()),
        ("code_challenge", code_challenge),
        ("code_challenge_method", "S256"),
    ]);

    let response = session.execute(step, request).await?.ensure_success(step)?;
    debug!(bytes = response.body.len(), "authorization page received");

    AuthorizationPage::parse(&response.body).map_err(|source| AuthError::PageContract { step, source })
}

fn access_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""accessToken"\s*:\s*"([^"]+)""#).expect("valid accessToken pattern"))
}

fn state_input_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"<input[^>]+name="state"[^>]+value="([^"]+)"|<input[^>]+value="([^"]+)"[^>]+name="state""#,
        )
        .expect("valid state input pattern")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Sign in</title></head>
<body>
<script>
  window._config = {"policyId":"262ce4b01d19dd9d385d26bddb4297b6","accessToken":"eyJhbGciOi.boot.strap","companyId":"c0"};
</script>
<form method="post" action="/as/resume">
  <input type="hidden" name="state" value="st2-echoed"/>
  <input type="hidden" name="dvResponse" value=""/>
</form>
</body>
</html>"#;

    #[test]
    fn pinned_fixture_satisfies_contract() {
        let page = AuthorizationPage::parse(FIXTURE).expect("contract holds");
        assert_eq!(page.bootstrap_token.as_str(), "eyJhbGciOi.boot.strap");
        assert_eq!(page.resumed_state.as_str(), "st2-echoed");
    }

    #[test]
    fn value_before_name_is_accepted() {
        let html = r#""accessToken":"tok1" <input type="hidden" value="st9" name="state">"#;
        let page = AuthorizationPage::parse(html).expect("contract holds");
        assert_eq!(page.resumed_state.as_str(), "st9");
    }

    #[test]
    fn missing_state_input_is_typed() {
        let html = r#"<script>{"accessToken":"tok1"}</script><form></form>"#;
        assert_eq!(
            AuthorizationPage::parse(html).unwrap_err(),
            PageContractError::MissingStateInput
        );
    }

    #[test]
    fn missing_access_token_is_typed() {
        let html = r#"<input type="hidden" name="state" value="st2">"#;
        assert_eq!(
            AuthorizationPage::parse(html).unwrap_err(),
            PageContractError::MissingBootstrapToken
        );
    }

    #[test]
    fn unrelated_hidden_inputs_are_ignored() {
        let html = r#""accessToken":"t" <input name="nonce" value="n1"><input name="state" value="s1">"#;
        let page = AuthorizationPage::parse(html).expect("contract holds");
        assert_eq!(page.resumed_state.as_str(), "s1");
    }
}
