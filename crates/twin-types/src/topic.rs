//! # Topic Paths
//!
//! Every protocol message names its target and meaning in a topic:
//!
//! ```text
//! {namespace}/{name}/things/{channel}/{criterion}[/{action...}]
//! {namespace}/{name}/policies/{criterion}[/{action...}]
//! ```
//!
//! Search and connection topics use `_` as namespace and name placeholders.

use crate::entities::ThingId;
use crate::errors::{TypeError, TypeResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder used by topics that address no particular entity.
pub const PLACEHOLDER: &str = "_";

/// Entity group of a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Things,
    Policies,
    Connections,
}

impl Group {
    fn as_str(self) -> &'static str {
        match self {
            Group::Things => "things",
            Group::Policies => "policies",
            Group::Connections => "connections",
        }
    }

    fn parse(segment: &str) -> Option<Self> {
        match segment {
            "things" => Some(Group::Things),
            "policies" => Some(Group::Policies),
            "connections" => Some(Group::Connections),
            _ => None,
        }
    }

    /// Only things distinguish twin and live channels.
    fn has_channel(self) -> bool {
        matches!(self, Group::Things)
    }
}

/// Channel of a things topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Persisted digital twin.
    Twin,
    /// Routed to the device itself.
    Live,
}

impl Channel {
    fn as_str(self) -> &'static str {
        match self {
            Channel::Twin => "twin",
            Channel::Live => "live",
        }
    }

    fn parse(segment: &str) -> Option<Self> {
        match segment {
            "twin" => Some(Channel::Twin),
            "live" => Some(Channel::Live),
            _ => None,
        }
    }
}

/// What kind of signal a topic carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Criterion {
    Commands,
    Events,
    Search,
    Messages,
    Acks,
    Errors,
    Announcements,
}

impl Criterion {
    fn as_str(self) -> &'static str {
        match self {
            Criterion::Commands => "commands",
            Criterion::Events => "events",
            Criterion::Search => "search",
            Criterion::Messages => "messages",
            Criterion::Acks => "acks",
            Criterion::Errors => "errors",
            Criterion::Announcements => "announcements",
        }
    }

    fn parse(segment: &str) -> Option<Self> {
        match segment {
            "commands" => Some(Criterion::Commands),
            "events" => Some(Criterion::Events),
            "search" => Some(Criterion::Search),
            "messages" => Some(Criterion::Messages),
            "acks" => Some(Criterion::Acks),
            "errors" => Some(Criterion::Errors),
            "announcements" => Some(Criterion::Announcements),
            _ => None,
        }
    }
}

/// Parsed protocol topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TopicPath {
    namespace: String,
    name: String,
    group: Group,
    channel: Option<Channel>,
    criterion: Criterion,
    action: Option<String>,
}

impl TopicPath {
    /// Assemble a topic from its parts. `channel` is ignored for groups
    /// that have none.
    #[must_use]
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        group: Group,
        channel: Option<Channel>,
        criterion: Criterion,
        action: Option<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            group,
            channel: if group.has_channel() { channel } else { None },
            criterion,
            action,
        }
    }

    /// Shorthand for a live command topic.
    #[must_use]
    pub fn live_command(thing_id: &ThingId, action: impl Into<String>) -> Self {
        Self::new(
            thing_id.namespace(),
            thing_id.name(),
            Group::Things,
            Some(Channel::Live),
            Criterion::Commands,
            Some(action.into()),
        )
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn group(&self) -> Group {
        self.group
    }

    #[must_use]
    pub fn channel(&self) -> Option<Channel> {
        self.channel
    }

    #[must_use]
    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    /// Trailing segments after the criterion, joined by `/`.
    #[must_use]
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    /// The addressed thing, unless the topic uses placeholders.
    #[must_use]
    pub fn thing_id(&self) -> Option<ThingId> {
        if self.group != Group::Things || self.name == PLACEHOLDER {
            return None;
        }
        ThingId::new(self.namespace.clone(), self.name.clone()).ok()
    }

    /// `{channel}/{criterion}` (or just the criterion), the part of the topic
    /// that says what kind of signal this is regardless of the entity.
    #[must_use]
    pub fn kind(&self) -> String {
        match self.channel {
            Some(channel) => format!(
                "{}/{}/{}",
                self.group.as_str(),
                channel.as_str(),
                self.criterion.as_str()
            ),
            None => format!("{}/{}", self.group.as_str(), self.criterion.as_str()),
        }
    }
}

impl FromStr for TopicPath {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| TypeError::InvalidTopic {
            topic: s.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = s.split('/');
        let namespace = segments.next().ok_or_else(|| invalid("missing namespace"))?;
        let name = segments
            .next()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| invalid("missing entity name"))?;
        let group = segments
            .next()
            .and_then(Group::parse)
            .ok_or_else(|| invalid("unknown group"))?;
        let channel = if group.has_channel() {
            Some(
                segments
                    .next()
                    .and_then(Channel::parse)
                    .ok_or_else(|| invalid("unknown channel"))?,
            )
        } else {
            None
        };
        let criterion = segments
            .next()
            .and_then(Criterion::parse)
            .ok_or_else(|| invalid("unknown criterion"))?;

        let rest: Vec<&str> = segments.collect();
        let action = if rest.is_empty() {
            None
        } else if rest.iter().any(|segment| segment.is_empty()) {
            return Err(invalid("empty action segment"));
        } else {
            Some(rest.join("/"))
        };

        Ok(Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            group,
            channel,
            criterion,
            action,
        })
    }
}

impl TryFrom<String> for TopicPath {
    type Error = TypeError;

    fn try_from(value: String) -> TypeResult<Self> {
        value.parse()
    }
}

impl From<TopicPath> for String {
    fn from(topic: TopicPath) -> Self {
        topic.to_string()
    }
}

impl fmt::Display for TopicPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.name, self.group.as_str())?;
        if let Some(channel) = self.channel {
            write!(f, "/{}", channel.as_str())?;
        }
        write!(f, "/{}", self.criterion.as_str())?;
        if let Some(action) = &self.action {
            write!(f, "/{action}")?;
        }
        Ok(())
    }
}
