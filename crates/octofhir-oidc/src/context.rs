//! Per-request context.

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Request-scoped context passed through the handler chain.
///
/// Cancellation is owned by the caller (typically the HTTP layer, which
/// cancels when the client disconnects). Handlers only observe it.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Identifier used to correlate log lines for one request.
    pub request_id: Uuid,

    cancellation: CancellationToken,
}

impl RequestContext {
    /// Creates a context with a fresh request id and its own cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self::with_cancellation(CancellationToken::new())
    }

    /// Creates a context observing an existing cancellation token.
    #[must_use]
    pub fn with_cancellation(cancellation: CancellationToken) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            cancellation,
        }
    }

    /// Returns `true` once the caller has cancelled the request.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Returns the underlying cancellation token.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
