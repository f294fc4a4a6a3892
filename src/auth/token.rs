use chrono::{DateTime, TimeDelta, Utc};

/// Opaque credential string whose `Debug` output never shows the value.
macro_rules! secret_string {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, concat!(stringify!($name), "(<redacted>)"))
            }
        }
    };
}

pub(crate) use secret_string;

secret_string!(
    /// Short-lived token scraped from the authorization page. Only valid for
    /// starting the login policy; never accepted by the fantasy API.
    BootstrapToken
);

secret_string!(
    /// Final OAuth bearer credential for the fantasy API.
    AccessToken
);

secret_string!(
    /// OAuth refresh token, captured for callers that renew on their own.
    RefreshToken
);

/// Terminal artifact of a successful handshake.
///
/// # Example
/// ```
/// use fpl_auth::auth::{AccessToken, RefreshToken, TokenPair};
///
/// let tokens = TokenPair::new(AccessToken::new("A1"), RefreshToken::new("R1"), Some(3600));
/// assert_eq!(tokens.access_token.as_str(), "A1");
/// assert!(!tokens.is_expired());
/// ```
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub obtained_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenPair {
    pub fn new(
        access_token: AccessToken,
        refresh_token: RefreshToken,
        expires_in_secs: Option<i64>,
    ) -> Self {
        let obtained_at = Utc::now();
        Self {
            access_token,
            refresh_token,
            obtained_at,
            expires_at: expires_in_secs
                .and_then(TimeDelta::try_seconds)
                .and_then(|lifetime| obtained_at.checked_add_signed(lifetime)),
        }
    }

    /// `false` when the provider did not say when the token expires, or
    /// reported a lifetime too large to represent.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Utc::now() >= exp)
    }
}
