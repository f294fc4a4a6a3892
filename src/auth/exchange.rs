//! Authorization-code grant.

use serde::Deserialize;
use tracing::debug;

use super::error::AuthError;
use super::pkce::PkceVerifier;
use super::resume::AuthorizationCode;
use super::session::{require, SessionContext};
use super::settings::HandshakeSettings;
use super::state::HandshakeStep;
use super::token::{AccessToken, RefreshToken, TokenPair};

/// Trade the code and verifier for the final token pair.
///
/// Both inputs are consumed: the provider burns the code whatever the
/// outcome, so a failed exchange can only be followed by a new handshake.
pub async fn exchange_code(
    session: &SessionContext,
    settings: &HandshakeSettings,
    code: AuthorizationCode,
    verifier: PkceVerifier,
) -> Result<TokenPair, AuthError> {
    let step = HandshakeStep::TokenExchange;
    let request = session.client().post(&settings.endpoints.token).form(&[
        ("grant_type", "authorization_code"),
        ("redirect_uri", settings.redirect_uri.as_str()),
        ("code", code.as_str()),
        ("code_verifier", verifier.as_str()),
        ("client_id", settings.client_id.as_str()),
    ]);

    let response = session.execute(step, request).await?;
    if !response.status.is_success() {
        let payload: TokenResponse = response.json(step).unwrap_or_default();
        if payload.error.as_deref() == Some("invalid_grant") {
            return Err(AuthError::AlreadyConsumed {
                step,
                reason: payload
                    .error_description
                    .unwrap_or_else(|| "authorization code expired or already used".to_string()),
            });
        }
    }
    let response = response.ensure_success(step)?;

    let payload: TokenResponse = response.json(step)?;
    let access_token = require(step, "access_token", payload.access_token)?;
    let refresh_token = require(step, "refresh_token", payload.refresh_token)?;
    debug!(expires_in = ?payload.expires_in, "token exchange complete");

    Ok(TokenPair::new(
        AccessToken::new(access_token),
        RefreshToken::new(refresh_token),
        payload.expires_in,
    ))
}

#[derive(Debug, Default, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    error: Option<String>,
    error_description: Option<String>,
}
