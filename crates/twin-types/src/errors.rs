//! # Error Types
//!
//! Validation errors raised while constructing protocol types.

use thiserror::Error;

/// Errors from validating protocol values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// Acknowledgement label does not match the label grammar.
    #[error("Invalid acknowledgement label: {label:?}")]
    InvalidLabel { label: String },

    /// Thing id is not of the form `namespace:name`.
    #[error("Invalid thing id: {id:?}")]
    InvalidThingId { id: String },

    /// Topic path could not be parsed.
    #[error("Invalid topic {topic:?}: {reason}")]
    InvalidTopic { topic: String, reason: String },

    /// HTTP status code outside 100..=599.
    #[error("Invalid HTTP status code: {code}")]
    InvalidStatus { code: u16 },
}

/// Result type for protocol type construction.
pub type TypeResult<T> = Result<T, TypeError>;
