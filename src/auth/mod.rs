//! Interactive sign-in handshake: PKCE authorization-code flow wrapped
//! around the provider's multi-step login policy.
//!
//! The steps run strictly in order, each consuming what the previous one
//! produced:
//!
//! 1. [`PkcePair::generate`] mints the verifier, challenge and initial state.
//! 2. [`fetch_authorization_page`] scrapes the bootstrap token and resume state.
//! 3. [`start_interaction`] opens the login policy.
//! 4. [`LoginSequencer`] posts poll-continue, credentials and confirmation.
//! 5. [`resume_authorization`] captures the authorization code.
//! 6. [`exchange_code`] trades it for a [`TokenPair`].
//!
//! [`Handshake`] runs the whole chain over one [`SessionContext`].

pub mod error;
pub mod exchange;
pub mod handshake;
pub mod interaction;
pub mod login;
pub mod page;
pub mod pkce;
pub mod resume;
pub mod session;
pub mod settings;
pub mod state;
pub mod token;

pub use error::{AuthError, FailureKind};
pub use exchange::exchange_code;
pub use handshake::Handshake;
pub use interaction::{start_interaction, InteractionContext, InteractionToken, StepEnvelope};
pub use login::{ConnectionBinding, DeviceResponse, DvResponse, LoginSequencer};
pub use page::{fetch_authorization_page, AuthorizationPage, PageContractError, ResumedState};
pub use pkce::{compute_code_challenge, InitialState, PkcePair, PkceVerifier};
pub use resume::{extract_code, resume_authorization, AuthorizationCode};
pub use session::{SessionContext, StepResponse};
pub use settings::{HandshakeSettings, ProviderEndpoints};
pub use state::{HandshakePhase, HandshakeStep};
pub use token::{AccessToken, BootstrapToken, RefreshToken, TokenPair};
