//! Fantasy API clients: public reads and the authenticated facade.

pub mod http;

pub use http::AuthScheme;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::auth::{AccessToken, Handshake, RefreshToken, TokenPair};
use crate::config::FplConfig;
use crate::error::{FplError, Result};

/// Sign in with `config`'s credentials and return an authenticated client.
///
/// Every call runs a brand-new handshake.
///
/// # Example
/// ```no_run
/// # async fn example() -> fpl_auth::error::Result<()> {
/// let config = fpl_auth::config::FplConfig::from_env()?;
/// let client = fpl_auth::client::login(&config).await?;
/// let me = client.me().await?;
/// println!("{me}");
/// # Ok(())
/// # }
/// ```
pub async fn login(config: &FplConfig) -> Result<FplClient> {
    let credentials = config.credentials()?;
    let mut handshake = Handshake::new(config.handshake_settings())?;
    let tokens = handshake.run(&credentials).await?;
    Ok(FplClient::new(tokens, config.api_base_url()))
}

/// Unauthenticated reads (bootstrap data, fixtures).
#[derive(Debug, Clone)]
pub struct PublicClient {
    http: reqwest::Client,
    api_base_url: String,
}

impl PublicClient {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            http: http::shared_client().clone(),
            api_base_url: api_base_url.into(),
        }
    }

    /// Players, teams and gameweeks.
    pub async fn bootstrap_static(&self) -> Result<Value> {
        self.get("bootstrap-static/").await
    }

    pub async fn fixtures(&self) -> Result<Value> {
        self.get("fixtures/").await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = join_url(&self.api_base_url, path);
        debug!(%url, "public API request");
        read_json(self.http.get(url)).await
    }
}

/// Bearer-authenticated facade over the fantasy API.
///
/// Holds the [`TokenPair`] from a completed handshake. The refresh token is
/// exposed for callers that renew on their own; this client never does.
#[derive(Debug, Clone)]
pub struct FplClient {
    http: reqwest::Client,
    api_base_url: String,
    tokens: TokenPair,
}

impl FplClient {
    pub fn new(tokens: TokenPair, api_base_url: impl Into<String>) -> Self {
        Self {
            http: http::shared_client().clone(),
            api_base_url: api_base_url.into(),
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenPair {
        &self.tokens
    }

    pub fn access_token(&self) -> &AccessToken {
        &self.tokens.access_token
    }

    pub fn refresh_token(&self) -> &RefreshToken {
        &self.tokens.refresh_token
    }

    /// Public endpoints through the same base URL.
    pub fn public(&self) -> PublicClient {
        PublicClient {
            http: self.http.clone(),
            api_base_url: self.api_base_url.clone(),
        }
    }

    /// The signed-in account (`/me/`).
    pub async fn me(&self) -> Result<Value> {
        self.get("me/", AuthScheme::XApiAuthorization).await
    }

    /// Picks, chips and transfers for one of the account's teams.
    pub async fn my_team(&self, team_id: u64) -> Result<Value> {
        self.get(&format!("my-team/{team_id}/"), AuthScheme::Authorization)
            .await
    }

    /// GET `path` with the access token attached under `scheme`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, scheme: AuthScheme) -> Result<T> {
        if self.tokens.is_expired() {
            return Err(FplError::Authentication(
                "access token has expired; sign in again".to_string(),
            ));
        }
        let url = join_url(&self.api_base_url, path);
        debug!(%url, %scheme, "authenticated API request");
        let headers = http::bearer_headers(self.tokens.access_token.as_str(), scheme)?;
        read_json(self.http.get(url).headers(headers)).await
    }
}

async fn read_json<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(http::status_to_error(status.as_u16(), &body));
    }
    Ok(serde_json::from_str(&body)?)
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
