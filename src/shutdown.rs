//! Shutdown signalling.
//!
//! The administrator's restart command does not exit the process itself; it
//! raises a [`ShutdownSignal`] that `main` waits on to stop the dispatcher
//! and exit, leaving the actual restart to the process supervisor.

use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Cloneable one-shot shutdown flag
#[derive(Clone, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
}

impl ShutdownSignal {
    /// Create a signal that has not been raised
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the hosting process to shut down
    pub fn request(&self, reason: &str) {
        warn!("Shutdown requested: {reason}");
        self.token.cancel();
    }

    /// Whether shutdown was requested
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until shutdown is requested
    pub async fn requested(&self) {
        self.token.cancelled().await;
    }
}
