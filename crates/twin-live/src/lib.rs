//! # Twin Live - Live Commands and Acknowledgements
//!
//! Live commands are requests routed straight to a device rather than to its
//! persisted twin. This crate turns the live commands the [`twin_bus`]
//! delivers into [`LiveCommandAcknowledgeable`] values: the application
//! answers the command through its answer builder and emits the
//! acknowledgements the sender requested through
//! [`AcknowledgementRequestHandle`]s.
//!
//! ## Flow
//!
//! ```text
//! AdaptableBus ──things/live/commands──→ GenericLiveCommand
//!                                            │
//!                                            ▼
//!                           LiveCommandAcknowledgeable::of(command, publisher)
//!                                 │                         │
//!                              answer()        handle_acknowledgement_requests()
//!                                 │                         │
//!                                 ▼                         ▼
//!                          CommandResponse          Acknowledgement per label
//!                                 └──────────┬──────────────┘
//!                                            ▼
//!                                     SignalPublisher
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod acknowledgeable;
pub mod command;
pub mod dispatch;
pub mod error;
pub mod handle;

// Re-export main types
pub use acknowledgeable::{Acknowledgeable, LiveCommandAcknowledgeable};
pub use command::{GenericLiveCommand, LiveCommand, LiveCommandAnswerBuilder};
pub use dispatch::{live_commands, subscribe_live_commands};
pub use error::{LiveError, LiveResult};
pub use handle::{AcknowledgementRequestHandle, SignalPublisher};
