//! Provider endpoints and protocol constants for the handshake.

use std::time::Duration;

use bon::Builder;

pub const DEFAULT_ACCOUNT_BASE_URL: &str = "https://account.premierleague.com";
pub const DEFAULT_CLIENT_ID: &str = "bfcbaf69-aade-4c1b-8f00-c1cb8a193030";
pub const DEFAULT_REDIRECT_URI: &str = "https://fantasy.premierleague.com/";
pub const DEFAULT_SCOPE: &str = "openid profile email offline_access";
pub const DEFAULT_POLICY_ID: &str = "262ce4b01d19dd9d385d26bddb4297b6";
/// Connector that serves the first two login steps.
pub const DEFAULT_CONNECTION_ID: &str = "0d8c928e4970386733ce110b9dda8412";
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(30);
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Identity-provider endpoints, consumed in this order by the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub authorize: String,
    pub start_policy: String,
    /// Prefix of the connection-scoped login endpoint.
    pub connections: String,
    pub resume: String,
    pub token: String,
}

impl ProviderEndpoints {
    /// Derive every endpoint from an account host and login policy id.
    ///
    /// ```
    /// use fpl_auth::auth::ProviderEndpoints;
    ///
    /// let endpoints = ProviderEndpoints::from_base_url("http://127.0.0.1:9000/", "p1");
    /// assert_eq!(endpoints.start_policy, "http://127.0.0.1:9000/davinci/policy/p1/start");
    /// assert_eq!(
    ///     endpoints.login_url("c2"),
    ///     "http://127.0.0.1:9000/davinci/connections/c2/capabilities/customHTMLTemplate"
    /// );
    /// ```
    pub fn from_base_url(base_url: &str, policy_id: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            authorize: format!("{base}/as/authorize"),
            start_policy: format!("{base}/davinci/policy/{policy_id}/start"),
            connections: format!("{base}/davinci/connections"),
            resume: format!("{base}/as/resume"),
            token: format!("{base}/as/token"),
        }
    }

    /// Login endpoint served by `connection_id`.
    pub fn login_url(&self, connection_id: &str) -> String {
        format!(
            "{}/{connection_id}/capabilities/customHTMLTemplate",
            self.connections.trim_end_matches('/')
        )
    }
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self::from_base_url(DEFAULT_ACCOUNT_BASE_URL, DEFAULT_POLICY_ID)
    }
}

/// Everything one handshake attempt needs besides the caller's credentials.
///
/// ```
/// use std::time::Duration;
/// use fpl_auth::auth::{HandshakeSettings, ProviderEndpoints};
///
/// let settings = HandshakeSettings::builder()
///     .endpoints(ProviderEndpoints::from_base_url("http://127.0.0.1:9000", "p1"))
///     .step_timeout(Duration::from_secs(5))
///     .build();
/// assert_eq!(settings.scope, "openid profile email offline_access");
/// ```
#[derive(Debug, Clone, Builder)]
pub struct HandshakeSettings {
    #[builder(default)]
    pub endpoints: ProviderEndpoints,
    #[builder(default = DEFAULT_CLIENT_ID.to_string())]
    pub client_id: String,
    #[builder(default = DEFAULT_REDIRECT_URI.to_string())]
    pub redirect_uri: String,
    #[builder(default = DEFAULT_SCOPE.to_string())]
    pub scope: String,
    #[builder(default = DEFAULT_CONNECTION_ID.to_string())]
    pub default_connection_id: String,
    #[builder(default = DEFAULT_STEP_TIMEOUT)]
    pub step_timeout: Duration,
    #[builder(default = BROWSER_USER_AGENT.to_string())]
    pub user_agent: String,
}

impl Default for HandshakeSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}
