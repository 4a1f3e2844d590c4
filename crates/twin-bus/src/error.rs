//! # Bus Errors

use crate::classifier::Classification;
use crate::subscription::SubscriptionId;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the adaptable bus.
///
/// One-time subscriptions fail with these through their future; idle
/// timeouts of durable subscriptions are reported through their
/// `on_timeout` callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// No matching message arrived within the one-time timeout.
    #[error("No message classified as {tag} arrived within {timeout:?}")]
    Timeout {
        tag: Classification,
        timeout: Duration,
    },

    /// A durable subscription saw no matching message for its idle timeout.
    #[error("Subscription {id} for {tag} idle for {timeout:?}")]
    IdleTimeout {
        id: SubscriptionId,
        tag: Classification,
        timeout: Duration,
    },

    /// The one-time subscription was explicitly unsubscribed.
    #[error("Subscription was removed before it resolved")]
    Unsubscribed,

    /// An exclusive subscription cleared the bus.
    #[error("Subscription evicted by exclusive subscription {by}")]
    Evicted { by: SubscriptionId },

    /// The timeout scheduler no longer accepts tasks.
    #[error("Timeout scheduler has been shut down")]
    SchedulerShutdown,

    /// The bus was created outside of a tokio runtime.
    #[error("No tokio runtime available to drive timeouts")]
    NoRuntime,

    /// The bus was dropped while the subscription was pending.
    #[error("Adaptable bus closed")]
    Closed,
}

impl BusError {
    /// Whether this is a one-time or idle timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, BusError::Timeout { .. } | BusError::IdleTimeout { .. })
    }
}

/// Result type for bus operations.
pub type BusResult<T> = Result<T, BusError>;

/// Why an inbound frame could not be parsed into an adaptable.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The frame is blank.
    #[error("Frame is empty")]
    Empty,

    /// The frame is not a protocol JSON message.
    #[error("Frame is not a protocol message: {0}")]
    Json(#[from] serde_json::Error),
}
