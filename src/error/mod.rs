//! Error types for fpl-auth.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use thiserror::Error;

use crate::auth::{AuthError, FailureKind};

/// Primary error type for configuration and API calls.
#[derive(Error, Debug)]
pub enum FplError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Sign-in failed: {0}")]
    Handshake(#[from] AuthError),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl FplError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::Handshake(err) => match err {
                AuthError::Timeout { .. } => ErrorCategory::Timeout,
                AuthError::Transport { .. } => ErrorCategory::Network,
                AuthError::Status { status, .. } if *status >= 500 => ErrorCategory::Server,
                AuthError::Setup { .. } | AuthError::Randomness { .. } => {
                    ErrorCategory::Configuration
                }
                _ => ErrorCategory::Authentication,
            },
            Self::Network(err) if err.is_timeout() => ErrorCategory::Timeout,
            Self::Network(_) => ErrorCategory::Network,
            Self::Configuration(_) | Self::InvalidArgument(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::Io(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether the same call may succeed if repeated as-is.
    ///
    /// Sign-in failures never are: the attempt's identifiers are spent.
    pub fn is_retryable(&self) -> bool {
        if matches!(self, Self::Handshake(_)) {
            return false;
        }
        matches!(
            self.category(),
            ErrorCategory::Network | ErrorCategory::Timeout | ErrorCategory::Server
        )
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        if let Self::Handshake(err) = self {
            return match err.kind() {
                FailureKind::Setup => RecoverySuggestion::CheckConfiguration,
                FailureKind::Rejection => RecoverySuggestion::CheckCredentials,
                _ => RecoverySuggestion::RestartHandshake,
            };
        }
        match self.category() {
            ErrorCategory::Authentication => RecoverySuggestion::CheckCredentials,
            ErrorCategory::Network | ErrorCategory::Server => RecoverySuggestion::RetryWithBackoff,
            ErrorCategory::Timeout => RecoverySuggestion::IncreaseTimeout,
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            _ => RecoverySuggestion::ContactSupport,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, FplError>;
