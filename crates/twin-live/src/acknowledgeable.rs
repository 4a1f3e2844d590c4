//! # Acknowledgeable Live Commands
//!
//! Wraps an inbound live command together with the outbound publisher so
//! the application can answer it and send the acknowledgements the sender
//! asked for in `requested-acks`.

use crate::command::LiveCommand;
use crate::handle::{AcknowledgementRequestHandle, SignalPublisher};
use std::sync::Arc;
use twin_types::AcknowledgementLabel;

/// Something that may carry acknowledgement requests.
pub trait Acknowledgeable {
    /// Hand every requested acknowledgement to `callback` at once, as one
    /// handle per label in request order.
    fn handle_acknowledgement_requests<F>(&self, callback: F)
    where
        F: FnOnce(Vec<AcknowledgementRequestHandle>);

    /// Hand the handle for `label` to `callback`, if that label was
    /// requested. Otherwise `callback` is not called.
    fn handle_acknowledgement_request<F>(&self, label: &AcknowledgementLabel, callback: F)
    where
        F: FnOnce(AcknowledgementRequestHandle);
}

/// An inbound live command plus the means to acknowledge it.
pub struct LiveCommandAcknowledgeable<C> {
    command: C,
    publisher: SignalPublisher,
}

impl<C: LiveCommand> LiveCommandAcknowledgeable<C> {
    #[must_use]
    pub fn of(command: C, publisher: SignalPublisher) -> Self {
        Self { command, publisher }
    }

    #[must_use]
    pub fn live_command(&self) -> &C {
        &self.command
    }

    #[must_use]
    pub fn into_live_command(self) -> C {
        self.command
    }

    /// The command's own answer builder.
    #[must_use]
    pub fn answer(&self) -> C::Answer {
        self.command.answer()
    }

    fn handle_for(&self, label: AcknowledgementLabel) -> AcknowledgementRequestHandle {
        AcknowledgementRequestHandle::new(
            label,
            self.command.entity_id().clone(),
            self.command.headers().clone(),
            Arc::clone(&self.publisher),
        )
    }
}

impl<C: LiveCommand> Acknowledgeable for LiveCommandAcknowledgeable<C> {
    fn handle_acknowledgement_requests<F>(&self, callback: F)
    where
        F: FnOnce(Vec<AcknowledgementRequestHandle>),
    {
        let handles = self
            .command
            .headers()
            .requested_acks()
            .into_iter()
            .map(|request| self.handle_for(request.label().clone()))
            .collect();
        callback(handles);
    }

    fn handle_acknowledgement_request<F>(&self, label: &AcknowledgementLabel, callback: F)
    where
        F: FnOnce(AcknowledgementRequestHandle),
    {
        let requested = self
            .command
            .headers()
            .requested_acks()
            .iter()
            .any(|request| request.label() == label);
        if requested {
            callback(self.handle_for(label.clone()));
        }
    }
}

impl<C: std::fmt::Debug> std::fmt::Debug for LiveCommandAcknowledgeable<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveCommandAcknowledgeable")
            .field("command", &self.command)
            .finish_non_exhaustive()
    }
}
