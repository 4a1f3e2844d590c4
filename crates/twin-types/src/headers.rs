//! # Protocol Headers
//!
//! Header keys are case-insensitive on the wire; they are stored lowercased.
//! Values are kept as JSON so that structured headers such as
//! `requested-acks` survive unchanged.

use crate::acks::{AcknowledgementLabel, AcknowledgementRequest};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Correlates a request with its responses and acknowledgements.
pub const CORRELATION_ID: &str = "correlation-id";

/// Ordered list of acknowledgement labels the sender asks for.
pub const REQUESTED_ACKS: &str = "requested-acks";

/// Whether the sender expects a response at all.
pub const RESPONSE_REQUIRED: &str = "response-required";

/// Header map of a protocol message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Headers(Map<String, Value>);

impl Headers {
    /// Empty header map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a header value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(&key.to_ascii_lowercase())
    }

    /// Look up a header whose value is a JSON string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Set a header, returning the previous value.
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<Value>) -> Option<Value> {
        self.0
            .insert(key.as_ref().to_ascii_lowercase(), value.into())
    }

    /// Builder-style [`Headers::insert`].
    #[must_use]
    pub fn with(mut self, key: impl AsRef<str>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Remove a header.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(&key.to_ascii_lowercase())
    }

    /// The `correlation-id` header.
    #[must_use]
    pub fn correlation_id(&self) -> Option<&str> {
        self.get_str(CORRELATION_ID)
    }

    /// The `response-required` header; absent means `true`.
    #[must_use]
    pub fn response_required(&self) -> bool {
        match self.get(RESPONSE_REQUIRED) {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(flag)) => !flag.eq_ignore_ascii_case("false"),
            _ => true,
        }
    }

    /// Requested acknowledgements in declaration order.
    ///
    /// The header is a JSON array of labels, or a string holding one.
    /// Duplicates keep their first position; invalid labels are skipped.
    #[must_use]
    pub fn requested_acks(&self) -> Vec<AcknowledgementRequest> {
        let raw = match self.get(REQUESTED_ACKS) {
            Some(Value::Array(items)) => items.clone(),
            Some(Value::String(encoded)) => match serde_json::from_str::<Vec<Value>>(encoded) {
                Ok(items) => items,
                Err(error) => {
                    debug!(%error, "Ignoring malformed requested-acks header");
                    return Vec::new();
                }
            },
            _ => return Vec::new(),
        };

        let mut requests: Vec<AcknowledgementRequest> = Vec::with_capacity(raw.len());
        for item in raw {
            let Some(text) = item.as_str() else {
                continue;
            };
            match AcknowledgementLabel::new(text) {
                Ok(label) => {
                    let request = AcknowledgementRequest::of(label);
                    if !requests.contains(&request) {
                        requests.push(request);
                    }
                }
                Err(error) => debug!(%error, "Skipping invalid requested acknowledgement"),
            }
        }
        requests
    }

    /// Replace the `requested-acks` header.
    #[must_use]
    pub fn with_requested_acks<I>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = AcknowledgementLabel>,
    {
        let labels: Vec<Value> = labels
            .into_iter()
            .map(|label| Value::String(label.into()))
            .collect();
        self.with(REQUESTED_ACKS, Value::Array(labels))
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// No headers set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(key, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for Headers {
    fn from(map: Map<String, Value>) -> Self {
        Self(
            map.into_iter()
                .map(|(key, value)| (key.to_ascii_lowercase(), value))
                .collect(),
        )
    }
}

impl From<Headers> for Map<String, Value> {
    fn from(headers: Headers) -> Self {
        headers.0
    }
}
