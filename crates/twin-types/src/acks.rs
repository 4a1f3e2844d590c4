//! # Acknowledgements
//!
//! Labels a sender may request in the `requested-acks` header, and the
//! acknowledgement signal a receiver sends back for each of them.
//!
//! ## Label Grammar
//!
//! A label is 3 to 165 characters of `[A-Za-z0-9-_:]`, or a placeholder of
//! the form `{{ ... }}` that the backend resolves (e.g. `{{connection:id}}`).

use crate::adaptable::Adaptable;
use crate::entities::{HttpStatus, ThingId};
use crate::errors::{TypeError, TypeResult};
use crate::headers::Headers;
use crate::topic::{Channel, Criterion, Group, TopicPath};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

const MIN_LABEL_LEN: usize = 3;
const MAX_LABEL_LEN: usize = 165;

/// Name of a requested acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AcknowledgementLabel(String);

impl AcknowledgementLabel {
    /// Built-in label: the twin change was persisted.
    pub const TWIN_PERSISTED: &'static str = "twin-persisted";
    /// Built-in label: a live response was received.
    pub const LIVE_RESPONSE: &'static str = "live-response";
    /// Built-in label: the change is visible to search.
    pub const SEARCH_PERSISTED: &'static str = "search-persisted";

    /// Validate and wrap a label.
    pub fn new(label: impl Into<String>) -> TypeResult<Self> {
        let label = label.into();
        if is_placeholder(&label) || is_plain_label(&label) {
            Ok(Self(label))
        } else {
            Err(TypeError::InvalidLabel { label })
        }
    }

    /// The label text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this label is one of the backend's built-in labels.
    #[must_use]
    pub fn is_built_in(&self) -> bool {
        matches!(
            self.0.as_str(),
            Self::TWIN_PERSISTED | Self::LIVE_RESPONSE | Self::SEARCH_PERSISTED
        )
    }
}

fn is_plain_label(label: &str) -> bool {
    (MIN_LABEL_LEN..=MAX_LABEL_LEN).contains(&label.len())
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'))
}

fn is_placeholder(label: &str) -> bool {
    label
        .strip_prefix("{{")
        .and_then(|rest| rest.strip_suffix("}}"))
        .is_some_and(|inner| !inner.trim().is_empty())
}

impl FromStr for AcknowledgementLabel {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for AcknowledgementLabel {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AcknowledgementLabel> for String {
    fn from(label: AcknowledgementLabel) -> Self {
        label.0
    }
}

impl fmt::Display for AcknowledgementLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A request for one acknowledgement, as declared in the `requested-acks`
/// header of an inbound signal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AcknowledgementRequest {
    label: AcknowledgementLabel,
}

impl AcknowledgementRequest {
    /// Request the given label.
    #[must_use]
    pub fn of(label: AcknowledgementLabel) -> Self {
        Self { label }
    }

    /// The requested label.
    #[must_use]
    pub fn label(&self) -> &AcknowledgementLabel {
        &self.label
    }
}

/// Acknowledgement sent back for one requested label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgement {
    /// The acknowledged label.
    pub label: AcknowledgementLabel,
    /// The thing the acknowledged command targeted.
    pub entity_id: ThingId,
    /// Outcome of the handling stage.
    pub status: HttpStatus,
    /// Headers of the acknowledged command (carries the correlation id).
    pub headers: Headers,
    /// Optional payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Acknowledgement {
    /// Build an acknowledgement without payload.
    #[must_use]
    pub fn of(
        label: AcknowledgementLabel,
        entity_id: ThingId,
        status: HttpStatus,
        headers: Headers,
    ) -> Self {
        Self {
            label,
            entity_id,
            status,
            headers,
            payload: None,
        }
    }

    /// Attach a payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Topic under which the acknowledgement travels:
    /// `{namespace}/{name}/things/twin/acks/{label}`.
    #[must_use]
    pub fn topic(&self) -> TopicPath {
        TopicPath::new(
            self.entity_id.namespace(),
            self.entity_id.name(),
            Group::Things,
            Some(Channel::Twin),
            Criterion::Acks,
            Some(self.label.to_string()),
        )
    }

    /// Structured form for the outbound transport.
    #[must_use]
    pub fn to_adaptable(&self) -> Adaptable {
        let mut adaptable = Adaptable::new(self.topic())
            .with_headers(self.headers.clone())
            .with_status(self.status);
        if let Some(payload) = &self.payload {
            adaptable = adaptable.with_value(payload.clone());
        }
        adaptable
    }
}
