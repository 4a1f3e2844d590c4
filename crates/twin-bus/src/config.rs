//! Bus configuration from environment variables.

use std::env;

/// Configuration of one adaptable bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    /// Name attached to every log line of this bus.
    pub name: String,

    /// Maximum characters of a frame quoted in log lines.
    pub frame_preview_len: usize,

    /// Log unhandled frames at warn instead of debug.
    pub warn_on_unhandled: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            name: "twin-bus".to_string(),
            frame_preview_len: 256,
            warn_on_unhandled: true,
        }
    }
}

impl BusConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TWIN_BUS_NAME`: Bus name in logs (default: twin-bus)
    /// - `TWIN_BUS_FRAME_PREVIEW`: Characters of a frame quoted in logs (default: 256)
    /// - `TWIN_BUS_UNHANDLED_WARN`: Log unhandled frames at warn (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            name: env::var("TWIN_BUS_NAME").unwrap_or(defaults.name),

            frame_preview_len: env::var("TWIN_BUS_FRAME_PREVIEW")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.frame_preview_len),

            warn_on_unhandled: env::var("TWIN_BUS_UNHANDLED_WARN")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.warn_on_unhandled),
        }
    }

    /// Configuration with a specific bus name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The first `frame_preview_len` characters of `raw`.
    #[must_use]
    pub fn preview<'a>(&self, raw: &'a str) -> &'a str {
        match raw.char_indices().nth(self.frame_preview_len) {
            Some((end, _)) => &raw[..end],
            None => raw,
        }
    }
}
