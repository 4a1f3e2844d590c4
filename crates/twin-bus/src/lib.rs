//! # Twin Bus - Inbound Frame Dispatch
//!
//! Every frame a twin client receives over its connection passes through an
//! [`AdaptableBus`]. The bus classifies the frame, first as raw text and then
//! as a parsed [`twin_types::Adaptable`], and hands it to whoever subscribed
//! for that classification.
//!
//! ## Subscription Kinds
//!
//! | Kind | Ends when | Outcome |
//! |------|-----------|---------|
//! | One-time string | first match, timeout, unsubscribe | future |
//! | One-time adaptable | first match, timeout, unsubscribe | future |
//! | Durable | unsubscribe | callback per match |
//! | Exclusive | unsubscribe | callback per match, clears the bus first |
//! | Timed | idle timeout, terminal message, unsubscribe | callback per match |
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use twin_bus::{classifier, AdaptableBus, BusConfig, Classification};
//!
//! # async fn run() -> twin_bus::BusResult<()> {
//! let bus = AdaptableBus::new(BusConfig::from_env())?;
//! bus.add_string_classifier(classifier::one_of(&["START-SEND-EVENTS:ACK"]))
//!     .add_adaptable_classifier(classifier::correlation_id());
//!
//! let ack = bus.subscribe_once_for_string(
//!     Classification::for_string("START-SEND-EVENTS:ACK"),
//!     Duration::from_secs(10),
//! );
//! bus.publish("START-SEND-EVENTS:ACK");
//! ack.await?;
//! # Ok(())
//! # }
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod bus;
pub mod classifier;
pub mod config;
pub mod error;
pub mod parser;
mod registry;
pub mod scheduler;
pub mod sink;
mod stats;
pub mod stream;
pub mod subscription;

// Re-export main types
pub use bus::{AdaptableBus, AdaptableBusBuilder, FramePublisher};
pub use classifier::{Classification, Classifier, ClassifierChain};
pub use config::BusConfig;
pub use error::{BusError, BusResult, ParseError};
pub use parser::{AdaptableParser, JsonAdaptableParser};
pub use scheduler::{ScheduledTask, TimeoutScheduler};
pub use sink::{LoggingUnhandledSink, UnhandledReason, UnhandledSink};
pub use stats::BusStatsSnapshot;
pub use stream::AdaptableStream;
pub use subscription::{OneTimeSubscription, SubscriptionId, SubscriptionKind};
