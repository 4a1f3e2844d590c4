//! # Classifiers
//!
//! A classifier maps a message to an optional [`Classification`]. The bus
//! keeps two ordered chains: one for raw text frames, one for parsed
//! adaptables. A chain returns the first classification any of its members
//! produces, in registration order.
//!
//! Classifiers must be pure: the same input always yields the same result
//! and classifying has no observable side effect.

use std::fmt;
use std::sync::Arc;
use twin_types::Adaptable;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Key {
    Text(String),
    CorrelationId(String),
    TopicKind(String),
    Custom { kind: &'static str, value: String },
}

/// Opaque routing key. Only equality matters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Classification(Key);

impl Classification {
    /// Key for a text frame, usually the frame itself.
    #[must_use]
    pub fn for_string(text: impl Into<String>) -> Self {
        Self(Key::Text(text.into()))
    }

    /// Key for messages carrying the given `correlation-id`.
    #[must_use]
    pub fn for_correlation_id(id: impl Into<String>) -> Self {
        Self(Key::CorrelationId(id.into()))
    }

    /// Key for a kind of signal, as produced by [`twin_types::TopicPath::kind`].
    #[must_use]
    pub fn for_topic_kind(kind: impl Into<String>) -> Self {
        Self(Key::TopicKind(kind.into()))
    }

    /// Key in an application-defined namespace. Keys of different kinds
    /// never compare equal, even with the same value.
    #[must_use]
    pub fn custom(kind: &'static str, value: impl Into<String>) -> Self {
        Self(Key::Custom {
            kind,
            value: value.into(),
        })
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Key::Text(text) => write!(f, "text:{text}"),
            Key::CorrelationId(id) => write!(f, "correlation-id:{id}"),
            Key::TopicKind(kind) => write!(f, "topic:{kind}"),
            Key::Custom { kind, value } => write!(f, "{kind}:{value}"),
        }
    }
}

/// Maps a message to an optional routing key.
pub trait Classifier<T: ?Sized>: Send + Sync {
    fn classify(&self, message: &T) -> Option<Classification>;
}

impl<T, F> Classifier<T> for F
where
    T: ?Sized,
    F: Fn(&T) -> Option<Classification> + Send + Sync,
{
    fn classify(&self, message: &T) -> Option<Classification> {
        self(message)
    }
}

/// Ordered list of classifiers; first match wins.
pub struct ClassifierChain<T: ?Sized + 'static> {
    classifiers: Vec<Arc<dyn Classifier<T>>>,
}

impl<T: ?Sized + 'static> ClassifierChain<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            classifiers: Vec::new(),
        }
    }

    /// Append a classifier after all existing ones.
    pub fn push(&mut self, classifier: Arc<dyn Classifier<T>>) {
        self.classifiers.push(classifier);
    }

    /// Classification of the first classifier that produces one.
    #[must_use]
    pub fn classify(&self, message: &T) -> Option<Classification> {
        self.classifiers
            .iter()
            .find_map(|classifier| classifier.classify(message))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classifiers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classifiers.is_empty()
    }
}

impl<T: ?Sized + 'static> Default for ClassifierChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// BUILT-IN CLASSIFIERS
// =============================================================================

/// Classifies a text frame as itself. Protocol control replies such as
/// `START-SEND-EVENTS:ACK` are awaited this way.
#[must_use]
pub fn identity() -> impl Classifier<str> {
    |raw: &str| Some(Classification::for_string(raw))
}

/// Classifies text frames found in `known` as themselves, ignoring others.
#[must_use]
pub fn one_of(known: &[&str]) -> impl Classifier<str> {
    let known: Vec<String> = known.iter().map(|s| (*s).to_string()).collect();
    move |raw: &str| {
        known
            .iter()
            .any(|k| k == raw)
            .then(|| Classification::for_string(raw))
    }
}

/// Classifies an adaptable by its `correlation-id` header.
#[must_use]
pub fn correlation_id() -> impl Classifier<Adaptable> {
    |adaptable: &Adaptable| {
        adaptable
            .correlation_id()
            .map(Classification::for_correlation_id)
    }
}

/// Classifies responses by their `correlation-id` header. Only messages
/// carrying a status (responses, acknowledgements, errors) match, so inbound
/// commands with a correlation id fall through to later classifiers.
#[must_use]
pub fn response_correlation_id() -> impl Classifier<Adaptable> {
    |adaptable: &Adaptable| {
        adaptable.status?;
        adaptable
            .correlation_id()
            .map(Classification::for_correlation_id)
    }
}

/// Classifies an adaptable by the kind of signal its topic carries, e.g.
/// `things/live/commands`.
#[must_use]
pub fn topic_kind() -> impl Classifier<Adaptable> {
    |adaptable: &Adaptable| Some(Classification::for_topic_kind(adaptable.topic.kind()))
}
