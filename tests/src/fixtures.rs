//! Shared fixtures: a bus wired the way a twin client wires it, frame
//! builders, and a channel-backed signal publisher.

use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc;
use twin_bus::{classifier, AdaptableBus, BusConfig, BusResult};
use twin_live::SignalPublisher;
use twin_types::Signal;

/// Control frames the backend sends as plain text.
pub const PROTOCOL_ACKS: [&str; 4] = [
    "START-SEND-EVENTS:ACK",
    "STOP-SEND-EVENTS:ACK",
    "START-SEND-LIVE-COMMANDS:ACK",
    "STOP-SEND-LIVE-COMMANDS:ACK",
];

/// Bus with the client's classifier setup: protocol control frames as text,
/// then responses by correlation id, then everything else by topic kind.
pub fn client_bus(name: &str) -> BusResult<AdaptableBus> {
    let bus = AdaptableBus::new(BusConfig::named(name))?;
    bus.add_string_classifier(classifier::one_of(&PROTOCOL_ACKS))
        .add_adaptable_classifier(classifier::response_correlation_id())
        .add_adaptable_classifier(classifier::topic_kind());
    Ok(bus)
}

/// Protocol JSON of a live command for `namespace:name`.
pub fn live_command_frame(
    thing: &str,
    action: &str,
    correlation_id: Option<&str>,
    requested_acks: &[&str],
) -> String {
    let (namespace, name) = thing.split_once(':').unwrap_or(("", thing));
    let mut headers = json!({ "requested-acks": requested_acks });
    if let Some(id) = correlation_id {
        headers["correlation-id"] = Value::from(id);
    }
    json!({
        "topic": format!("{namespace}/{name}/things/live/commands/{action}"),
        "headers": headers,
        "path": "/features/lamp/properties/on",
        "value": true,
    })
    .to_string()
}

/// Protocol JSON of a twin event for `namespace:name`.
pub fn twin_event_frame(thing: &str, value: Value) -> String {
    let (namespace, name) = thing.split_once(':').unwrap_or(("", thing));
    json!({
        "topic": format!("{namespace}/{name}/things/twin/events/modified"),
        "path": "/attributes",
        "value": value,
    })
    .to_string()
}

/// Publisher that forwards every signal into a channel.
pub fn channel_publisher() -> (SignalPublisher, mpsc::UnboundedReceiver<Signal>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let publisher: SignalPublisher = Arc::new(move |signal: Signal| {
        if sender.send(signal).is_err() {
            tracing::debug!("Signal receiver dropped");
        }
    });
    (publisher, receiver)
}

/// Drain everything currently buffered in `receiver`.
pub fn drain(receiver: &mut mpsc::UnboundedReceiver<Signal>) -> Vec<Signal> {
    let mut signals = Vec::new();
    while let Ok(signal) = receiver.try_recv() {
        signals.push(signal);
    }
    signals
}
