//! Handshake state machine.

use strum::Display;

use super::error::AuthError;

/// Network or local step of the sign-in handshake.
///
/// Every [`AuthError`] is tagged with the step that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum HandshakeStep {
    Session,
    Pkce,
    Authorize,
    StartPolicy,
    PollContinue,
    SubmitCredentials,
    ConfirmSignOn,
    Resume,
    TokenExchange,
}

/// Position of one attempt in the strictly linear handshake.
///
/// ```
/// use fpl_auth::auth::{HandshakePhase, HandshakeStep};
///
/// let phase = HandshakePhase::Start.advance(HandshakeStep::Pkce).unwrap();
/// assert_eq!(phase, HandshakePhase::PkceReady);
/// assert!(phase.advance(HandshakeStep::Resume).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum HandshakePhase {
    Start,
    PkceReady,
    PageFetched,
    InteractionStarted,
    Step1Done,
    Step2Done,
    Step3Done,
    Resumed,
    TokenExchanged,
    Failed,
}

impl HandshakePhase {
    /// The only step allowed to leave this phase.
    pub fn expected_step(self) -> Option<HandshakeStep> {
        match self {
            Self::Start => Some(HandshakeStep::Pkce),
            Self::PkceReady => Some(HandshakeStep::Authorize),
            Self::PageFetched => Some(HandshakeStep::StartPolicy),
            Self::InteractionStarted => Some(HandshakeStep::PollContinue),
            Self::Step1Done => Some(HandshakeStep::SubmitCredentials),
            Self::Step2Done => Some(HandshakeStep::ConfirmSignOn),
            Self::Step3Done => Some(HandshakeStep::Resume),
            Self::Resumed => Some(HandshakeStep::TokenExchange),
            Self::TokenExchanged | Self::Failed => None,
        }
    }

    /// Move past `step`, or fail if `step` is not the next one in line.
    pub fn advance(self, step: HandshakeStep) -> Result<Self, AuthError> {
        if self.expected_step() != Some(step) {
            return Err(AuthError::OutOfOrder { step, phase: self });
        }
        Ok(match step {
            HandshakeStep::Session | HandshakeStep::Pkce => Self::PkceReady,
            HandshakeStep::Authorize => Self::PageFetched,
            HandshakeStep::StartPolicy => Self::InteractionStarted,
            HandshakeStep::PollContinue => Self::Step1Done,
            HandshakeStep::SubmitCredentials => Self::Step2Done,
            HandshakeStep::ConfirmSignOn => Self::Step3Done,
            HandshakeStep::Resume => Self::Resumed,
            HandshakeStep::TokenExchange => Self::TokenExchanged,
        })
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::TokenExchanged | Self::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER: [HandshakeStep; 8] = [
        HandshakeStep::Pkce,
        HandshakeStep::Authorize,
        HandshakeStep::StartPolicy,
        HandshakeStep::PollContinue,
        HandshakeStep::SubmitCredentials,
        HandshakeStep::ConfirmSignOn,
        HandshakeStep::Resume,
        HandshakeStep::TokenExchange,
    ];

    #[test]
    fn full_sequence_reaches_token_exchanged() {
        let mut phase = HandshakePhase::Start;
        for step in ORDER {
            phase = phase.advance(step).expect("in-order step");
        }
        assert_eq!(phase, HandshakePhase::TokenExchanged);
        assert!(phase.is_terminal());
    }

    #[test]
    fn skipping_credentials_is_out_of_order() {
        let err = HandshakePhase::Step1Done
            .advance(HandshakeStep::ConfirmSignOn)
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::OutOfOrder {
                step: HandshakeStep::ConfirmSignOn,
                phase: HandshakePhase::Step1Done
            }
        ));
    }

    #[test]
    fn failed_phase_accepts_nothing() {
        for step in ORDER {
            assert!(HandshakePhase::Failed.advance(step).is_err());
        }
    }

    #[test]
    fn repeating_a_step_is_rejected() {
        let phase = HandshakePhase::Step2Done;
        assert!(phase.advance(HandshakeStep::SubmitCredentials).is_err());
    }

    #[test]
    fn steps_display_in_snake_case() {
        assert_eq!(HandshakeStep::SubmitCredentials.to_string(), "submit_credentials");
        assert_eq!(HandshakePhase::PageFetched.to_string(), "page_fetched");
    }
}
