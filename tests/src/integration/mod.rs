//! Cross-crate integration flows.

pub mod concurrency;
pub mod live_commands;
pub mod protocol;
pub mod telemetry;
