//! Login-policy start: bootstrap token in, interaction credentials out.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use tracing::debug;

use super::error::AuthError;
use super::session::{require, SessionContext};
use super::settings::ProviderEndpoints;
use super::state::HandshakeStep;
use super::token::{secret_string, BootstrapToken};

secret_string!(
    /// `interactionToken` header value for every login step.
    InteractionToken
);

/// Credentials scoping every login-step request of one policy execution.
///
/// Obtained once and reused unchanged across all three login steps, even
/// after the connection id rotates.
#[derive(Debug, Clone)]
pub struct InteractionContext {
    pub interaction_id: String,
    pub interaction_token: InteractionToken,
}

/// Continuation id threading one login response into the next request.
///
/// Deliberately not `Clone`: each envelope is handed to exactly one step.
#[derive(Debug, PartialEq, Eq)]
pub struct StepEnvelope {
    id: String,
}

impl StepEnvelope {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartPolicyResponse {
    interaction_id: Option<String>,
    interaction_token: Option<String>,
    id: Option<String>,
}

/// Start the login policy and return its interaction scope plus the first
/// step envelope.
pub async fn start_interaction(
    session: &SessionContext,
    endpoints: &ProviderEndpoints,
    bootstrap_token: &BootstrapToken,
) -> Result<(InteractionContext, StepEnvelope), AuthError> {
    let step = HandshakeStep::StartPolicy;
    let request = session
        .client()
        .post(&endpoints.start_policy)
        .header(AUTHORIZATION, format!("Bearer {}", bootstrap_token.as_str()))
        .header(CONTENT_TYPE, "application/json");

    let response = session.execute(step, request).await?.ensure_success(step)?;
    let payload: StartPolicyResponse = response.json(step)?;

    let interaction = InteractionContext {
        interaction_id: require(step, "interactionId", payload.interaction_id)?,
        interaction_token: InteractionToken::new(require(
            step,
            "interactionToken",
            payload.interaction_token,
        )?),
    };
    let envelope = StepEnvelope::new(require(step, "id", payload.id)?);
    debug!("login policy started");

    Ok((interaction, envelope))
}
