//! End-to-end sign-in handshake.

use tracing::{debug, info, warn};

use super::error::AuthError;
use super::exchange::exchange_code;
use super::interaction::start_interaction;
use super::login::LoginSequencer;
use super::page::fetch_authorization_page;
use super::pkce::PkcePair;
use super::resume::resume_authorization;
use super::session::SessionContext;
use super::settings::HandshakeSettings;
use super::state::{HandshakePhase, HandshakeStep};
use super::token::TokenPair;
use crate::config::Credentials;

/// One sign-in attempt.
///
/// A handshake owns its session context and runs at most once. After
/// [`run`](Self::run) its phase is terminal (`TokenExchanged` or `Failed`)
/// and a second run is refused; retrying means building a new handshake,
/// which mints fresh PKCE material and a fresh cookie jar.
///
/// # Example
/// ```no_run
/// use fpl_auth::auth::{Handshake, HandshakeSettings};
/// use fpl_auth::config::Credentials;
///
/// # async fn example() -> Result<(), fpl_auth::auth::AuthError> {
/// let mut handshake = Handshake::new(HandshakeSettings::default())?;
/// let tokens = handshake
///     .run(&Credentials::new("me@example.com", "secret"))
///     .await?;
/// println!("signed in, expires at {:?}", tokens.expires_at);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Handshake {
    settings: HandshakeSettings,
    session: SessionContext,
    phase: HandshakePhase,
}

impl Handshake {
    pub fn new(settings: HandshakeSettings) -> Result<Self, AuthError> {
        let session = SessionContext::new(&settings.user_agent, settings.step_timeout)?;
        Ok(Self {
            settings,
            session,
            phase: HandshakePhase::Start,
        })
    }

    pub fn phase(&self) -> HandshakePhase {
        self.phase
    }

    /// Drive every step in order and return the token pair, or the first
    /// failure tagged with the step that produced it.
    pub async fn run(&mut self, credentials: &Credentials) -> Result<TokenPair, AuthError> {
        info!("starting sign-in handshake");
        let result = self.drive(credentials).await;
        match &result {
            Ok(_) => info!("sign-in handshake complete"),
            Err(err) => {
                warn!(
                    step = %err.step(),
                    kind = %err.kind(),
                    last_phase = %self.phase,
                    error = %err,
                    "sign-in handshake failed"
                );
                self.phase = HandshakePhase::Failed;
            }
        }
        result
    }

    async fn drive(&mut self, credentials: &Credentials) -> Result<TokenPair, AuthError> {
        transition(&mut self.phase, HandshakeStep::Pkce)?;
        let (pkce, initial_state) = PkcePair::generate()?;

        let page = fetch_authorization_page(
            &self.session,
            &self.settings,
            pkce.challenge(),
            &initial_state,
        )
        .await?;
        transition(&mut self.phase, HandshakeStep::Authorize)?;

        let (interaction, envelope) =
            start_interaction(&self.session, &self.settings.endpoints, &page.bootstrap_token)
                .await?;
        transition(&mut self.phase, HandshakeStep::StartPolicy)?;

        let mut sequencer = LoginSequencer::new(
            &self.session,
            &self.settings.endpoints,
            interaction,
            &self.settings.default_connection_id,
        );
        let envelope = sequencer.poll_continue(envelope).await?;
        transition(&mut self.phase, HandshakeStep::PollContinue)?;
        let envelope = sequencer.submit_credentials(envelope, credentials).await?;
        transition(&mut self.phase, HandshakeStep::SubmitCredentials)?;
        let device = sequencer
            .confirm_sign_on(envelope, page.resumed_state)
            .await?;
        transition(&mut self.phase, HandshakeStep::ConfirmSignOn)?;

        let code = resume_authorization(&self.session, &self.settings.endpoints, device).await?;
        transition(&mut self.phase, HandshakeStep::Resume)?;

        let tokens = exchange_code(&self.session, &self.settings, code, pkce.into_verifier()).await?;
        transition(&mut self.phase, HandshakeStep::TokenExchange)?;
        Ok(tokens)
    }
}

fn transition(phase: &mut HandshakePhase, step: HandshakeStep) -> Result<(), AuthError> {
    *phase = phase.advance(step)?;
    debug!(%step, phase = %phase, "handshake transition");
    Ok(())
}
