//! Configuration system (layered: code > env > TOML file > defaults).

pub mod credentials;

pub use credentials::Credentials;

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::auth::settings::{
    DEFAULT_ACCOUNT_BASE_URL, DEFAULT_CLIENT_ID, DEFAULT_CONNECTION_ID, DEFAULT_POLICY_ID,
    DEFAULT_REDIRECT_URI, DEFAULT_SCOPE, DEFAULT_STEP_TIMEOUT,
};
use crate::auth::{HandshakeSettings, ProviderEndpoints};
use crate::error::{FplError, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://fantasy.premierleague.com/api";

/// Layered configuration for sign-in and API access.
///
/// Resolution order, highest first:
/// 1. Values set in code (`with_*`)
/// 2. Environment variables (a `.env` file is loaded if present)
/// 3. A TOML config file
/// 4. Built-in defaults for the public client
#[derive(Clone)]
pub struct FplConfig {
    username: Option<String>,
    password: Option<String>,
    account_base_url: String,
    api_base_url: String,
    client_id: String,
    redirect_uri: String,
    scope: String,
    policy_id: String,
    default_connection_id: String,
    timeout: Duration,
}

impl fmt::Debug for FplConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FplConfig")
            .field("username", &self.username.as_ref().map(|_| ".."))
            .field("password", &self.password.as_ref().map(|_| ".."))
            .field("account_base_url", &self.account_base_url)
            .field("api_base_url", &self.api_base_url)
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("scope", &self.scope)
            .field("policy_id", &self.policy_id)
            .field("default_connection_id", &self.default_connection_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for FplConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Shape of the optional TOML config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    email: Option<String>,
    password: Option<String>,
    account_base_url: Option<String>,
    api_base_url: Option<String>,
    client_id: Option<String>,
    redirect_uri: Option<String>,
    scope: Option<String>,
    policy_id: Option<String>,
    default_connection_id: Option<String>,
    timeout_secs: Option<u64>,
}

impl FplConfig {
    /// Defaults only, no credentials.
    pub fn new() -> Self {
        Self {
            username: None,
            password: None,
            account_base_url: DEFAULT_ACCOUNT_BASE_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            policy_id: DEFAULT_POLICY_ID.to_string(),
            default_connection_id: DEFAULT_CONNECTION_ID.to_string(),
            timeout: DEFAULT_STEP_TIMEOUT,
        }
    }

    /// Load from environment variables (FPL_EMAIL, FPL_PASSWORD, etc.).
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Defaults, then `path` (if given), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::new();
        if let Some(path) = path {
            config = config.merge_toml_file(path)?;
        }
        config.merge_env(|key| std::env::var(key).ok())
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Self::new().merge_toml(raw)
    }

    pub fn merge_toml_file(self, path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "loading config file");
        self.merge_toml(&raw)
    }

    /// Overlay values from a TOML document.
    pub fn merge_toml(mut self, raw: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(raw)
            .map_err(|err| FplError::Configuration(format!("invalid config file: {err}")))?;

        let text_fields = [
            (file.email, &mut self.username),
            (file.password, &mut self.password),
        ];
        for (value, slot) in text_fields {
            if value.is_some() {
                *slot = value;
            }
        }
        let setting_fields = [
            (file.account_base_url, &mut self.account_base_url),
            (file.api_base_url, &mut self.api_base_url),
            (file.client_id, &mut self.client_id),
            (file.redirect_uri, &mut self.redirect_uri),
            (file.scope, &mut self.scope),
            (file.policy_id, &mut self.policy_id),
            (file.default_connection_id, &mut self.default_connection_id),
        ];
        for (value, slot) in setting_fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        Ok(self)
    }

    /// Overlay values from environment-style `lookup`.
    ///
    /// `FPL_EMAIL`/`FPL_PASSWORD` win over the bare `EMAIL`/`PASSWORD`.
    pub fn merge_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let first = |keys: &[&str]| keys.iter().find_map(|key| lookup(*key));

        if let Some(email) = first(&["FPL_EMAIL", "EMAIL"]) {
            self.username = Some(email);
        }
        if let Some(password) = first(&["FPL_PASSWORD", "PASSWORD"]) {
            self.password = Some(password);
        }

        let url_mappings = [
            ("FPL_ACCOUNT_BASE_URL", &mut self.account_base_url),
            ("FPL_API_BASE_URL", &mut self.api_base_url),
        ];
        for (env_var, slot) in url_mappings {
            if let Some(url) = lookup(env_var) {
                *slot = url;
            }
        }

        if let Some(raw) = lookup("FPL_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                FplError::Configuration(format!("FPL_TIMEOUT_SECS is not a number: {raw}"))
            })?;
            self.timeout = Duration::from_secs(secs);
        }
        Ok(self)
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.username = Some(credentials.username().to_string());
        self.password = Some(credentials.password().to_string());
        self
    }

    pub fn with_account_base_url(mut self, url: impl Into<String>) -> Self {
        self.account_base_url = url.into();
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Credentials for sign-in; both halves must be configured.
    pub fn credentials(&self) -> Result<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Ok(Credentials::new(username, password)),
            (None, _) => Err(FplError::Configuration(
                "no username configured (set FPL_EMAIL)".to_string(),
            )),
            (_, None) => Err(FplError::Configuration(
                "no password configured (set FPL_PASSWORD)".to_string(),
            )),
        }
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Settings for one handshake attempt.
    pub fn handshake_settings(&self) -> HandshakeSettings {
        HandshakeSettings::builder()
            .endpoints(ProviderEndpoints::from_base_url(
                &self.account_base_url,
                &self.policy_id,
            ))
            .client_id(self.client_id.clone())
            .redirect_uri(self.redirect_uri.clone())
            .scope(self.scope.clone())
            .default_connection_id(self.default_connection_id.clone())
            .step_timeout(self.timeout)
            .build()
    }
}
