//! # Twin Telemetry
//!
//! Logging setup shared by applications embedding the twin client.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use twin_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() {
//!     init_logging(&TelemetryConfig::from_env()).expect("Failed to init logging");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TWIN_SERVICE_NAME` | `twin-client` | Service name in logs |
//! | `TWIN_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `TWIN_CONSOLE_OUTPUT` | `true` | Write logs to the console |
//! | `TWIN_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{env_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter {directive:?}: {reason}")]
    InvalidFilter { directive: String, reason: String },

    #[error("A global tracing subscriber is already installed")]
    AlreadyInitialized,
}
