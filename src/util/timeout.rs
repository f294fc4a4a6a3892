//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::auth::{AuthError, HandshakeStep};

/// Bound a handshake step by `duration`. Expiry fails the step like any
/// other transport error.
pub async fn with_timeout<T>(
    step: HandshakeStep,
    duration: Duration,
    future: impl Future<Output = Result<T, AuthError>>,
) -> Result<T, AuthError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(AuthError::Timeout {
            step,
            timeout_ms: duration.as_millis() as u64,
        }),
    }
}
