//! PKCE verifier/challenge pairs and the initial correlation state.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use super::error::AuthError;
use super::state::HandshakeStep;
use super::token::secret_string;

/// Random bytes behind each verifier; encodes to 86 URL-safe characters.
const VERIFIER_BYTES: usize = 64;

secret_string!(
    /// PKCE code verifier. Consumed by the token exchange.
    PkceVerifier
);

/// `state` parameter sent with the authorization request.
#[derive(Clone, PartialEq, Eq)]
pub struct InitialState(String);

impl InitialState {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for InitialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InitialState").field(&self.0).finish()
    }
}

/// Verifier plus its S256 challenge, minted fresh for every attempt.
#[derive(Debug)]
pub struct PkcePair {
    verifier: PkceVerifier,
    challenge: String,
}

impl PkcePair {
    /// Mint a new pair and an initial correlation state from the OS CSPRNG.
    pub fn generate() -> Result<(Self, InitialState), AuthError> {
        let mut verifier_bytes = [0u8; VERIFIER_BYTES];
        fill_random(&mut verifier_bytes)?;
        let mut state_bytes = [0u8; 16];
        fill_random(&mut state_bytes)?;

        let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);
        let state = uuid::Builder::from_random_bytes(state_bytes)
            .into_uuid()
            .simple()
            .to_string();

        Ok((Self::from_verifier(verifier), InitialState(state)))
    }

    /// Build a pair around a known verifier.
    pub fn from_verifier(verifier: impl Into<String>) -> Self {
        let verifier = PkceVerifier::new(verifier);
        let challenge = compute_code_challenge(verifier.as_str());
        Self {
            verifier,
            challenge,
        }
    }

    pub fn challenge(&self) -> &str {
        &self.challenge
    }

    pub fn verifier(&self) -> &PkceVerifier {
        &self.verifier
    }

    pub fn into_verifier(self) -> PkceVerifier {
        self.verifier
    }
}

/// `base64url(SHA-256(verifier))` without padding.
pub fn compute_code_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

fn fill_random(buf: &mut [u8]) -> Result<(), AuthError> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|err| AuthError::Randomness {
            step: HandshakeStep::Pkce,
            message: err.to_string(),
        })
}
