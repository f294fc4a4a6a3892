use strum::Display;
use thiserror::Error;

use super::page::PageContractError;
use super::state::{HandshakePhase, HandshakeStep};

/// Broad failure class of a handshake error.
///
/// Every class is fatal for the attempt that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    /// Local setup failed before any request was sent.
    Setup,
    /// Connection failure, timeout, or non-success HTTP status.
    Transport,
    /// An expected field or HTML pattern was absent.
    ProtocolShape,
    /// A well-formed response that refuses the sign-in.
    Rejection,
    /// A single-use value (code, envelope id, verifier) was replayed.
    SingleUseViolation,
}

/// Step-tagged sign-in handshake error.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{step}: session setup failed: {message}")]
    Setup { step: HandshakeStep, message: String },
    #[error("{step}: randomness source unavailable: {message}")]
    Randomness { step: HandshakeStep, message: String },
    #[error("{step}: transport failure: {message}")]
    Transport { step: HandshakeStep, message: String },
    #[error("{step}: timed out after {timeout_ms}ms")]
    Timeout { step: HandshakeStep, timeout_ms: u64 },
    #[error("{step}: unexpected HTTP status {status}")]
    Status {
        step: HandshakeStep,
        status: u16,
        body: String,
    },
    #[error("{step}: malformed response body: {message}")]
    MalformedBody { step: HandshakeStep, message: String },
    #[error("{step}: response missing `{field}`")]
    MissingField {
        step: HandshakeStep,
        field: &'static str,
    },
    #[error("{step}: {source}")]
    PageContract {
        step: HandshakeStep,
        #[source]
        source: PageContractError,
    },
    #[error("{step}: rejected: {reason}")]
    Rejected { step: HandshakeStep, reason: String },
    #[error("{step}: already consumed: {reason}")]
    AlreadyConsumed { step: HandshakeStep, reason: String },
    #[error("{step}: not allowed in phase {phase}")]
    OutOfOrder {
        step: HandshakeStep,
        phase: HandshakePhase,
    },
}

impl AuthError {
    pub(crate) fn transport(step: HandshakeStep, error: reqwest::Error) -> Self {
        Self::Transport {
            step,
            message: error.to_string(),
        }
    }

    /// Step at which the handshake failed.
    pub fn step(&self) -> HandshakeStep {
        match self {
            Self::Setup { step, .. }
            | Self::Randomness { step, .. }
            | Self::Transport { step, .. }
            | Self::Timeout { step, .. }
            | Self::Status { step, .. }
            | Self::MalformedBody { step, .. }
            | Self::MissingField { step, .. }
            | Self::PageContract { step, .. }
            | Self::Rejected { step, .. }
            | Self::AlreadyConsumed { step, .. }
            | Self::OutOfOrder { step, .. } => *step,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Setup { .. } | Self::Randomness { .. } => FailureKind::Setup,
            Self::Transport { .. } | Self::Timeout { .. } | Self::Status { .. } => {
                FailureKind::Transport
            }
            Self::MalformedBody { .. }
            | Self::MissingField { .. }
            | Self::PageContract { .. }
            | Self::OutOfOrder { .. } => FailureKind::ProtocolShape,
            Self::Rejected { .. } => FailureKind::Rejection,
            Self::AlreadyConsumed { .. } => FailureKind::SingleUseViolation,
        }
    }

    /// Handshake errors never resume from the last good step; the only
    /// recovery is a brand-new attempt with fresh PKCE material.
    pub fn requires_restart(&self) -> bool {
        true
    }
}
