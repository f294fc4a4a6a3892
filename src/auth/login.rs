//! Three-step credential submission against the login policy.
//!
//! Every request carries the interaction headers and the envelope id from
//! the step before it. The second step hands control to a different
//! connector; the third step must be posted to that connector.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::AuthError;
use super::interaction::{InteractionContext, StepEnvelope};
use super::page::ResumedState;
use super::session::{require, SessionContext};
use super::settings::ProviderEndpoints;
use super::state::{HandshakePhase, HandshakeStep};
use super::token::secret_string;
use crate::config::Credentials;

const CONTINUE_EVENT: &str = "continue";

secret_string!(
    /// `dvResponse` asserting a completed interactive login.
    DvResponse
);

/// Connector currently serving login requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionBinding {
    connection_id: String,
    rotated: bool,
}

impl ConnectionBinding {
    pub fn new(default_connection_id: impl Into<String>) -> Self {
        Self {
            connection_id: default_connection_id.into(),
            rotated: false,
        }
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Whether the provider has handed the flow to a new connector.
    pub fn is_rotated(&self) -> bool {
        self.rotated
    }

    fn rotate(&mut self, connection_id: String) {
        self.connection_id = connection_id;
        self.rotated = true;
    }
}

/// Proof of completed login, consumed once at resume.
#[derive(Debug)]
pub struct DeviceResponse {
    pub dv_response: DvResponse,
    pub state: ResumedState,
}

/// Drives poll-continue, credential submission and confirmation in order.
///
/// The sequencer tracks its own [`HandshakePhase`]; calling a step out of
/// order, or any step after a failure, returns [`AuthError::OutOfOrder`]
/// without touching the network.
#[derive(Debug)]
pub struct LoginSequencer<'a> {
    session: &'a SessionContext,
    endpoints: &'a ProviderEndpoints,
    interaction: InteractionContext,
    connection: ConnectionBinding,
    phase: HandshakePhase,
}

impl<'a> LoginSequencer<'a> {
    pub fn new(
        session: &'a SessionContext,
        endpoints: &'a ProviderEndpoints,
        interaction: InteractionContext,
        default_connection_id: &str,
    ) -> Self {
        Self {
            session,
            endpoints,
            interaction,
            connection: ConnectionBinding::new(default_connection_id),
            phase: HandshakePhase::InteractionStarted,
        }
    }

    pub fn phase(&self) -> HandshakePhase {
        self.phase
    }

    pub fn connection(&self) -> &ConnectionBinding {
        &self.connection
    }

    /// Endpoint the next login step will be posted to.
    pub fn current_login_url(&self) -> String {
        self.endpoints.login_url(self.connection.connection_id())
    }

    /// Run all three steps and return the device response.
    pub async fn run(
        mut self,
        envelope: StepEnvelope,
        credentials: &Credentials,
        resumed_state: ResumedState,
    ) -> Result<DeviceResponse, AuthError> {
        let envelope = self.poll_continue(envelope).await?;
        let envelope = self.submit_credentials(envelope, credentials).await?;
        self.confirm_sign_on(envelope, resumed_state).await
    }

    /// Step 1: acknowledge the polling event.
    pub async fn poll_continue(&mut self, envelope: StepEnvelope) -> Result<StepEnvelope, AuthError> {
        let step = HandshakeStep::PollContinue;
        let next = self.begin(step)?;
        let body = PollContinueRequest {
            id: envelope.id(),
            event_name: CONTINUE_EVENT,
            parameters: PollParameters {
                event_type: "polling",
            },
            poll_props: PollProps {
                status: CONTINUE_EVENT,
                delay_in_ms: 10,
                retries_allowed: 1,
                poll_challenge_status: false,
            },
        };
        let result = self
            .post_step(step, &body)
            .await
            .and_then(|reply| require(step, "id", reply.id).map(StepEnvelope::new));
        self.finish(next, result)
    }

    /// Step 2: submit username and password. On success the provider names
    /// the connector that serves the rest of the flow.
    pub async fn submit_credentials(
        &mut self,
        envelope: StepEnvelope,
        credentials: &Credentials,
    ) -> Result<StepEnvelope, AuthError> {
        let step = HandshakeStep::SubmitCredentials;
        let next = self.begin(step)?;
        let body = FormSubmitRequest::new(
            envelope.id(),
            FormParameters::sign_on(Some(credentials)),
        );
        let result = self
            .post_step(step, &body)
            .await
            .and_then(|reply| accept_credentials(step, reply));
        let result = result.map(|(envelope, connection_id)| {
            debug!(
                from = %self.connection.connection_id(),
                to = %connection_id,
                "login connection rotated"
            );
            self.connection.rotate(connection_id);
            envelope
        });
        self.finish(next, result)
    }

    /// Step 3: confirm sign-on against the rotated connector.
    pub async fn confirm_sign_on(
        &mut self,
        envelope: StepEnvelope,
        resumed_state: ResumedState,
    ) -> Result<DeviceResponse, AuthError> {
        let step = HandshakeStep::ConfirmSignOn;
        let next = self.begin(step)?;
        let body = FormSubmitRequest::new(envelope.id(), FormParameters::sign_on(None));
        let result = self.post_step(step, &body).await.and_then(|reply| {
            require(step, "dvResponse", reply.dv_response).map(|dv| DeviceResponse {
                dv_response: DvResponse::new(dv),
                state: resumed_state,
            })
        });
        self.finish(next, result)
    }

    fn begin(&mut self, step: HandshakeStep) -> Result<HandshakePhase, AuthError> {
        self.phase.advance(step).inspect_err(|_| {
            self.phase = HandshakePhase::Failed;
        })
    }

    fn finish<T>(
        &mut self,
        next: HandshakePhase,
        result: Result<T, AuthError>,
    ) -> Result<T, AuthError> {
        self.phase = if result.is_ok() {
            next
        } else {
            HandshakePhase::Failed
        };
        result
    }

    async fn post_step<B: Serialize>(
        &self,
        step: HandshakeStep,
        body: &B,
    ) -> Result<StepReply, AuthError> {
        let url = self.current_login_url();
        debug!(%step, connection_id = %self.connection.connection_id(), "posting login step");
        let request = self
            .session
            .client()
            .post(url)
            .header("interactionId", self.interaction.interaction_id.as_str())
            .header("interactionToken", self.interaction.interaction_token.as_str())
            .json(body);
        let response = self.session.execute(step, request).await?.ensure_success(step)?;
        response.json(step)
    }
}

/// A reply carrying an envelope but no connection id means the connector
/// evaluated the credentials and refused them.
fn accept_credentials(
    step: HandshakeStep,
    reply: StepReply,
) -> Result<(StepEnvelope, String), AuthError> {
    let envelope = StepEnvelope::new(require(step, "id", reply.id)?);
    match reply.connection_id {
        Some(connection_id) if !connection_id.is_empty() => Ok((envelope, connection_id)),
        _ => Err(AuthError::Rejected {
            step,
            reason: "credentials were not accepted (no connectionId in reply)".to_string(),
        }),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StepReply {
    id: Option<String>,
    connection_id: Option<String>,
    dv_response: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PollContinueRequest<'a> {
    id: &'a str,
    event_name: &'static str,
    parameters: PollParameters,
    poll_props: PollProps,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PollParameters {
    event_type: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PollProps {
    status: &'static str,
    delay_in_ms: u32,
    retries_allowed: u32,
    poll_challenge_status: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FormSubmitRequest<'a> {
    id: &'a str,
    next_event: NextEvent,
    parameters: FormParameters<'a>,
    event_name: &'static str,
}

impl<'a> FormSubmitRequest<'a> {
    fn new(id: &'a str, parameters: FormParameters<'a>) -> Self {
        Self {
            id,
            next_event: NextEvent::default(),
            parameters,
            event_name: CONTINUE_EVENT,
        }
    }
}

/// Continuation descriptor the policy expects on form submissions.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NextEvent {
    construct_type: &'static str,
    event_name: &'static str,
    params: [&'static str; 0],
    event_type: &'static str,
    post_process: PostProcess,
}

impl Default for NextEvent {
    fn default() -> Self {
        Self {
            construct_type: "skEvent",
            event_name: CONTINUE_EVENT,
            params: [],
            event_type: "post",
            post_process: PostProcess {},
        }
    }
}

#[derive(Debug, Serialize)]
struct PostProcess {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FormParameters<'a> {
    button_type: &'static str,
    button_value: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
}

impl<'a> FormParameters<'a> {
    fn sign_on(credentials: Option<&'a Credentials>) -> Self {
        Self {
            button_type: "form-submit",
            button_value: "SIGNON",
            username: credentials.map(|c| c.username()),
            password: credentials.map(|c| c.password()),
        }
    }
}
