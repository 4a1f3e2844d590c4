//! # Frame Parser
//!
//! Turns a raw text frame into an [`Adaptable`]. The default parser reads
//! protocol JSON; transports with another encoding plug in their own.

use crate::error::ParseError;
use twin_types::Adaptable;

/// Parses raw frames into adaptables.
pub trait AdaptableParser: Send + Sync {
    fn parse(&self, raw: &str) -> Result<Adaptable, ParseError>;
}

/// Protocol JSON parser backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonAdaptableParser;

impl AdaptableParser for JsonAdaptableParser {
    fn parse(&self, raw: &str) -> Result<Adaptable, ParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ParseError::Empty);
        }
        Ok(serde_json::from_str(trimmed)?)
    }
}
