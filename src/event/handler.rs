use async_trait::async_trait;
use thiserror::Error;

use super::events::RaidEvent;

/// Errors a handler can report back to the dispatcher.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("handler timed out")]
    Timeout,

    #[error("retryable error: {0}")]
    Retryable(String),

    #[error("non-retryable error: {0}")]
    NonRetryable(String),
}

impl EventError {
    /// Whether the dispatcher should retry the handler for this event.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EventError::Retryable(_) | EventError::Timeout)
    }

    pub fn retryable(msg: impl Into<String>) -> Self {
        EventError::Retryable(msg.into())
    }

    pub fn non_retryable(msg: impl Into<String>) -> Self {
        EventError::NonRetryable(msg.into())
    }
}

/// A reactive component fed by the dispatcher.
///
/// The crate ships two (lifecycle and combat stats); hosts can register
/// their own, e.g. a reward distributor listening for `RaidClosed`.
/// Handlers should be idempotent where possible: the same event may be
/// retried after a transient failure.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &RaidEvent) -> Result<(), EventError>;

    /// Human-readable name for logging.
    fn name(&self) -> &'static str;
}
