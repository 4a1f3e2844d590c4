//! # Live Errors

use thiserror::Error;
use twin_types::TopicPath;

/// Why an adaptable could not be taken as a live command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiveError {
    /// The topic is not `things/live/commands`.
    #[error("Not a live command: {topic}")]
    NotALiveCommand { topic: TopicPath },

    /// The topic does not name a concrete thing.
    #[error("Live command topic {topic} does not address a thing")]
    MissingThingId { topic: TopicPath },
}

/// Result type for live-command operations.
pub type LiveResult<T> = Result<T, LiveError>;
