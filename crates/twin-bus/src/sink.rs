//! # Unhandled Sink
//!
//! Receives every frame the bus could not route: frames that do not parse
//! as protocol messages, frames no classifier recognizes, and frames whose
//! classification has no subscriber.

use crate::classifier::Classification;
use crate::config::BusConfig;
use crate::error::ParseError;
use tracing::{debug, warn};

/// Why a frame reached the unhandled sink.
#[derive(Debug)]
pub enum UnhandledReason {
    /// The frame is not a structured protocol message.
    ParseFailed(ParseError),
    /// No adaptable classifier recognized the message.
    Unclassified,
    /// Nobody subscribed for the message's classification.
    NoSubscriber(Classification),
}

/// Destination of unroutable frames.
pub trait UnhandledSink: Send + Sync {
    fn unhandled(&self, raw: &str, reason: &UnhandledReason);
}

impl<F> UnhandledSink for F
where
    F: Fn(&str, &UnhandledReason) + Send + Sync,
{
    fn unhandled(&self, raw: &str, reason: &UnhandledReason) {
        self(raw, reason)
    }
}

/// Default sink: logs the frame and drops it.
#[derive(Debug, Clone)]
pub struct LoggingUnhandledSink {
    config: BusConfig,
}

impl LoggingUnhandledSink {
    #[must_use]
    pub fn new(config: BusConfig) -> Self {
        Self { config }
    }
}

impl UnhandledSink for LoggingUnhandledSink {
    fn unhandled(&self, raw: &str, reason: &UnhandledReason) {
        let frame = self.config.preview(raw);
        let bus = self.config.name.as_str();
        if self.config.warn_on_unhandled {
            warn!(bus, reason = ?reason, frame, "Dropping unhandled frame");
        } else {
            debug!(bus, reason = ?reason, frame, "Dropping unhandled frame");
        }
    }
}
