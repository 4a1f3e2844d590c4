//! # Acknowledgement Request Handles
//!
//! One handle per acknowledgement label a sender requested. Emitting through
//! the handle publishes an [`Acknowledgement`] for that label, addressed to
//! the command's thing and carrying the command's headers so the sender can
//! correlate it.
//!
//! Handles are only created by [`crate::LiveCommandAcknowledgeable`].

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use twin_types::{Acknowledgement, AcknowledgementLabel, Headers, HttpStatus, Signal, ThingId};

/// Outbound channel for signals produced while handling a command.
pub type SignalPublisher = Arc<dyn Fn(Signal) + Send + Sync>;

/// Sends the acknowledgement for one requested label.
///
/// Emitting is not guarded: every call publishes another acknowledgement.
#[derive(Clone)]
pub struct AcknowledgementRequestHandle {
    label: AcknowledgementLabel,
    entity_id: ThingId,
    headers: Headers,
    publisher: SignalPublisher,
}

impl AcknowledgementRequestHandle {
    pub(crate) fn new(
        label: AcknowledgementLabel,
        entity_id: ThingId,
        headers: Headers,
        publisher: SignalPublisher,
    ) -> Self {
        Self {
            label,
            entity_id,
            headers,
            publisher,
        }
    }

    /// The requested label this handle answers.
    #[must_use]
    pub fn label(&self) -> &AcknowledgementLabel {
        &self.label
    }

    /// The thing the acknowledged command targeted.
    #[must_use]
    pub fn entity_id(&self) -> &ThingId {
        &self.entity_id
    }

    /// Headers of the acknowledged command.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The acknowledgement this handle would publish, without publishing it.
    #[must_use]
    pub fn build(&self, status: HttpStatus) -> Acknowledgement {
        Acknowledgement::of(
            self.label.clone(),
            self.entity_id.clone(),
            status,
            self.headers.clone(),
        )
    }

    /// Publish the acknowledgement with `status`.
    pub fn acknowledge(&self, status: HttpStatus) {
        self.emit(self.build(status));
    }

    /// Publish the acknowledgement with `status` and a payload.
    pub fn acknowledge_with_payload(&self, status: HttpStatus, payload: Value) {
        self.emit(self.build(status).with_payload(payload));
    }

    fn emit(&self, ack: Acknowledgement) {
        debug!(
            label = %ack.label,
            entity_id = %ack.entity_id,
            status = %ack.status,
            correlation_id = ?ack.headers.correlation_id(),
            "Publishing acknowledgement"
        );
        (self.publisher)(Signal::Acknowledgement(ack));
    }
}

impl fmt::Debug for AcknowledgementRequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcknowledgementRequestHandle")
            .field("label", &self.label)
            .field("entity_id", &self.entity_id)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}
