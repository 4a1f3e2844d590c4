//! # Adaptable
//!
//! The structured form of a protocol frame: topic, headers, resource path,
//! optional value and optional status. Produced by the bus's frame parser and
//! handed to structured subscribers.

use crate::entities::HttpStatus;
use crate::headers::Headers;
use crate::topic::TopicPath;
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn root_path() -> String {
    "/".to_string()
}

/// Parsed protocol message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adaptable {
    pub topic: TopicPath,
    #[serde(default)]
    pub headers: Headers,
    #[serde(default = "root_path")]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<HttpStatus>,
}

impl Adaptable {
    /// Message addressing the root resource, with no headers.
    #[must_use]
    pub fn new(topic: TopicPath) -> Self {
        Self {
            topic,
            headers: Headers::new(),
            path: root_path(),
            value: None,
            status: None,
        }
    }

    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: HttpStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Shorthand for the correlation id header.
    #[must_use]
    pub fn correlation_id(&self) -> Option<&str> {
        self.headers.correlation_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_protocol_json() {
        let adaptable: Adaptable = serde_json::from_value(json!({
            "topic": "org.acme/lamp/things/live/commands/modify",
            "headers": {"correlation-id": "c-7"},
            "path": "/features/light/properties/on",
            "value": true
        }))
        .unwrap();

        assert_eq!(adaptable.correlation_id(), Some("c-7"));
        assert_eq!(adaptable.path, "/features/light/properties/on");
        assert_eq!(adaptable.value, Some(json!(true)));
        assert_eq!(adaptable.status, None);
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let adaptable: Adaptable =
            serde_json::from_value(json!({"topic": "org.acme/lamp/things/twin/events/modified"}))
                .unwrap();
        assert_eq!(adaptable.path, "/");
        assert!(adaptable.headers.is_empty());
    }

    #[test]
    fn test_invalid_topic_is_a_deserialize_error() {
        let result: Result<Adaptable, _> =
            serde_json::from_value(json!({"topic": "nonsense", "path": "/"}));
        assert!(result.is_err());
    }
}
