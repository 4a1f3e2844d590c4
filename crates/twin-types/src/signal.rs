//! # Outbound Signals
//!
//! Everything the client hands back to the transport for publishing:
//! acknowledgements for requested labels and responses to live commands.

use crate::acks::Acknowledgement;
use crate::adaptable::Adaptable;
use crate::entities::HttpStatus;
use crate::headers::Headers;
use crate::topic::TopicPath;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response to a live command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    /// Topic of the answered command.
    pub topic: TopicPath,
    /// Headers of the answered command.
    pub headers: Headers,
    /// Resource path of the answered command.
    pub path: String,
    pub status: HttpStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl CommandResponse {
    /// Structured form for the outbound transport.
    #[must_use]
    pub fn to_adaptable(&self) -> Adaptable {
        let mut adaptable = Adaptable::new(self.topic.clone())
            .with_headers(self.headers.clone())
            .with_path(self.path.clone())
            .with_status(self.status);
        if let Some(payload) = &self.payload {
            adaptable = adaptable.with_value(payload.clone());
        }
        adaptable
    }
}

/// A signal published outward by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Signal {
    Acknowledgement(Acknowledgement),
    CommandResponse(CommandResponse),
}

impl Signal {
    /// Headers of the signal.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        match self {
            Signal::Acknowledgement(ack) => &ack.headers,
            Signal::CommandResponse(response) => &response.headers,
        }
    }

    /// Structured form for the outbound transport.
    #[must_use]
    pub fn to_adaptable(&self) -> Adaptable {
        match self {
            Signal::Acknowledgement(ack) => ack.to_adaptable(),
            Signal::CommandResponse(response) => response.to_adaptable(),
        }
    }
}

impl From<Acknowledgement> for Signal {
    fn from(ack: Acknowledgement) -> Self {
        Signal::Acknowledgement(ack)
    }
}

impl From<CommandResponse> for Signal {
    fn from(response: CommandResponse) -> Self {
        Signal::CommandResponse(response)
    }
}
