//! # Live Commands
//!
//! A live command is a request routed to the device itself instead of its
//! persisted twin. The device answers it with a command response and may
//! also owe acknowledgements for the labels the sender requested.

use crate::error::{LiveError, LiveResult};
use serde_json::Value;
use twin_types::{
    Adaptable, Channel, CommandResponse, Criterion, Headers, HttpStatus, ThingId, TopicPath,
};

/// Capabilities every inbound live command offers.
pub trait LiveCommand {
    /// Builder for the command's response.
    type Answer;

    /// Headers the sender attached, including `requested-acks`.
    fn headers(&self) -> &Headers;

    /// The thing the command targets.
    fn entity_id(&self) -> &ThingId;

    /// Start building the answer to this command.
    fn answer(&self) -> Self::Answer;
}

/// Live command of any action, as received from the bus.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericLiveCommand {
    topic: TopicPath,
    entity_id: ThingId,
    headers: Headers,
    path: String,
    value: Option<Value>,
}

impl GenericLiveCommand {
    #[must_use]
    pub fn topic(&self) -> &TopicPath {
        &self.topic
    }

    /// Command action, e.g. `modify` or `retrieve`.
    #[must_use]
    pub fn action(&self) -> Option<&str> {
        self.topic.action()
    }

    /// Addressed resource within the thing.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

impl TryFrom<Adaptable> for GenericLiveCommand {
    type Error = LiveError;

    fn try_from(adaptable: Adaptable) -> LiveResult<Self> {
        let topic = adaptable.topic;
        if topic.channel() != Some(Channel::Live) || topic.criterion() != Criterion::Commands {
            return Err(LiveError::NotALiveCommand { topic });
        }
        let Some(entity_id) = topic.thing_id() else {
            return Err(LiveError::MissingThingId { topic });
        };
        Ok(Self {
            topic,
            entity_id,
            headers: adaptable.headers,
            path: adaptable.path,
            value: adaptable.value,
        })
    }
}

impl LiveCommand for GenericLiveCommand {
    type Answer = LiveCommandAnswerBuilder;

    fn headers(&self) -> &Headers {
        &self.headers
    }

    fn entity_id(&self) -> &ThingId {
        &self.entity_id
    }

    fn answer(&self) -> LiveCommandAnswerBuilder {
        LiveCommandAnswerBuilder {
            topic: self.topic.clone(),
            headers: self.headers.clone(),
            path: self.path.clone(),
        }
    }
}

/// Builds the response to one live command.
#[derive(Debug, Clone)]
pub struct LiveCommandAnswerBuilder {
    topic: TopicPath,
    headers: Headers,
    path: String,
}

impl LiveCommandAnswerBuilder {
    /// Response without payload.
    #[must_use]
    pub fn response(self, status: HttpStatus) -> CommandResponse {
        CommandResponse {
            topic: self.topic,
            headers: self.headers,
            path: self.path,
            status,
            payload: None,
        }
    }

    /// Response carrying `payload`.
    #[must_use]
    pub fn response_with_payload(self, status: HttpStatus, payload: Value) -> CommandResponse {
        CommandResponse {
            payload: Some(payload),
            ..self.response(status)
        }
    }
}
