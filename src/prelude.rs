//! Convenience re-exports for common use.

pub use crate::auth::{AuthError, FailureKind, Handshake, HandshakeSettings, TokenPair};
pub use crate::client::{login, AuthScheme, FplClient, PublicClient};
pub use crate::config::{Credentials, FplConfig};
pub use crate::error::{FplError, Result};
