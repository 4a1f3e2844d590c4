//! # Core Entities
//!
//! Identity and status values that appear in every signal.

use crate::errors::{TypeError, TypeResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// THING IDENTITY
// =============================================================================

/// Identifier of a thing (digital twin): `namespace:name`.
///
/// The namespace may be empty; the name may contain further colons since only
/// the first colon separates the two parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ThingId {
    namespace: String,
    name: String,
}

impl ThingId {
    /// Build a thing id from its two parts.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> TypeResult<Self> {
        let namespace = namespace.into();
        let name = name.into();
        if name.is_empty() || namespace.contains('/') || name.contains('/') {
            return Err(TypeError::InvalidThingId {
                id: format!("{namespace}:{name}"),
            });
        }
        Ok(Self { namespace, name })
    }

    /// The namespace part.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The name part.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for ThingId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, name) = s.split_once(':').ok_or_else(|| TypeError::InvalidThingId {
            id: s.to_string(),
        })?;
        Self::new(namespace, name)
    }
}

impl TryFrom<String> for ThingId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ThingId> for String {
    fn from(id: ThingId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for ThingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

// =============================================================================
// STATUS
// =============================================================================

/// HTTP-style status code carried by responses and acknowledgements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct HttpStatus(u16);

impl HttpStatus {
    pub const OK: Self = Self(200);
    pub const CREATED: Self = Self(201);
    pub const ACCEPTED: Self = Self(202);
    pub const NO_CONTENT: Self = Self(204);
    pub const BAD_REQUEST: Self = Self(400);
    pub const NOT_FOUND: Self = Self(404);
    pub const REQUEST_TIMEOUT: Self = Self(408);
    pub const FAILED_DEPENDENCY: Self = Self(424);
    pub const INTERNAL_SERVER_ERROR: Self = Self(500);

    /// Validate and wrap a status code.
    pub fn new(code: u16) -> TypeResult<Self> {
        if (100..=599).contains(&code) {
            Ok(Self(code))
        } else {
            Err(TypeError::InvalidStatus { code })
        }
    }

    /// The numeric code.
    #[must_use]
    pub fn code(self) -> u16 {
        self.0
    }

    /// 2xx codes.
    #[must_use]
    pub fn is_success(self) -> bool {
        (200..300).contains(&self.0)
    }
}

impl TryFrom<u16> for HttpStatus {
    type Error = TypeError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        Self::new(code)
    }
}

impl From<HttpStatus> for u16 {
    fn from(status: HttpStatus) -> Self {
        status.0
    }
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
