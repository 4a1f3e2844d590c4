//! # Twin Types Crate
//!
//! Protocol types shared by every layer of the twin client: the dispatch
//! bus (`twin-bus`) and the live-command acknowledgement layer (`twin-live`).
//!
//! ## Contents
//!
//! - **Headers**: case-insensitive protocol header map with typed accessors
//!   for `correlation-id` and `requested-acks`.
//! - **Topic paths**: `{namespace}/{name}/{group}/{channel}/{criterion}/{action}`
//! - **Adaptable**: the structured form of an inbound protocol frame.
//! - **Acknowledgements**: labels, requests and the acknowledgement signal.
//! - **Signals**: everything the client publishes back to the transport.

pub mod acks;
pub mod adaptable;
pub mod entities;
pub mod errors;
pub mod headers;
pub mod signal;
pub mod topic;

pub use acks::{Acknowledgement, AcknowledgementLabel, AcknowledgementRequest};
pub use adaptable::Adaptable;
pub use entities::{HttpStatus, ThingId};
pub use errors::{TypeError, TypeResult};
pub use headers::Headers;
pub use signal::{CommandResponse, Signal};
pub use topic::{Channel, Criterion, Group, TopicPath};
