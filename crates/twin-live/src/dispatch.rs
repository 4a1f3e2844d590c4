//! Wiring of live-command handlers onto an [`AdaptableBus`].

use crate::acknowledgeable::LiveCommandAcknowledgeable;
use crate::command::{GenericLiveCommand, LiveCommand};
use crate::handle::SignalPublisher;
use std::sync::Arc;
use tracing::{debug, warn};
use twin_bus::{AdaptableBus, Classification, SubscriptionId};
use twin_types::Adaptable;

const LIVE_COMMANDS_KIND: &str = "things/live/commands";

/// Classification of every inbound live command, as produced by
/// [`twin_bus::classifier::topic_kind`].
#[must_use]
pub fn live_commands() -> Classification {
    Classification::for_topic_kind(LIVE_COMMANDS_KIND)
}

/// Invoke `handler` for every live command the bus routes to `tag`.
///
/// Each command arrives wrapped with `publisher`, so the handler can answer
/// it and acknowledge its requested labels. Adaptables classified as `tag`
/// that are not live commands are logged and skipped.
pub fn subscribe_live_commands<H>(
    bus: &AdaptableBus,
    tag: Classification,
    publisher: SignalPublisher,
    handler: H,
) -> SubscriptionId
where
    H: Fn(LiveCommandAcknowledgeable<GenericLiveCommand>) + Send + Sync + 'static,
{
    bus.subscribe_for_adaptable(tag, move |adaptable: &Adaptable| {
        match GenericLiveCommand::try_from(adaptable.clone()) {
            Ok(command) => {
                debug!(
                    topic = %command.topic(),
                    correlation_id = ?command.headers().correlation_id(),
                    "Dispatching live command"
                );
                handler(LiveCommandAcknowledgeable::of(command, Arc::clone(&publisher)));
            }
            Err(error) => warn!(%error, "Skipping adaptable routed as live command"),
        }
    })
}
