//! # Protocol Flows
//!
//! Client-side flows that mix plain-text control frames with structured
//! messages on one connection:
//!
//! 1. **Handshake**: waiting for `START-SEND-EVENTS:ACK` while twin events
//!    already stream in.
//! 2. **Streaming session**: a timed subscription fed until a terminal
//!    message, or ended by an idle timeout.
//! 3. **Takeover**: an exclusive subscription replacing a previous session.

#[cfg(test)]
mod tests {
    use crate::fixtures::{client_bus, live_command_frame, twin_event_frame};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_stream::StreamExt;
    use twin_bus::{BusError, Classification, SubscriptionKind};

    fn twin_events() -> Classification {
        Classification::for_topic_kind("things/twin/events")
    }

    // =============================================================================
    // HANDSHAKE
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_handshake_ack_while_events_stream() {
        let bus = client_bus("client").unwrap();
        let mut events = bus.subscribe_for_adaptable_stream(twin_events());
        let ack = bus.subscribe_once_for_string(
            Classification::for_string("START-SEND-EVENTS:ACK"),
            Duration::from_secs(10),
        );

        bus.publish(&twin_event_frame("org.acme:lamp", json!({"on": true})));
        bus.publish("START-SEND-EVENTS:ACK");
        bus.publish(&twin_event_frame("org.acme:lamp", json!({"on": false})));

        assert_eq!(ack.await.unwrap(), "START-SEND-EVENTS:ACK");
        assert_eq!(events.next().await.unwrap().value, Some(json!({"on": true})));
        assert_eq!(events.next().await.unwrap().value, Some(json!({"on": false})));
        assert_eq!(bus.stats().unhandled, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_handshake_ack_times_out() {
        let bus = client_bus("client").unwrap();
        let ack = bus.subscribe_once_for_string(
            Classification::for_string("START-SEND-LIVE-COMMANDS:ACK"),
            Duration::from_secs(10),
        );

        // A different control frame does not satisfy the wait.
        bus.publish("STOP-SEND-EVENTS:ACK");

        assert!(ack.await.unwrap_err().is_timeout());
    }

    // =============================================================================
    // STREAMING SESSION
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_session_ends_on_terminal_message() {
        let bus = client_bus("client").unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));
        let received_clone = Arc::clone(&received);
        let timed_out = Arc::new(AtomicUsize::new(0));
        let timed_out_clone = Arc::clone(&timed_out);

        let session = bus
            .subscribe_for_adaptable_with_timeout(
                twin_events(),
                Duration::from_millis(100),
                move |adaptable| received_clone.lock().push(adaptable.value.clone()),
                |adaptable| adaptable.value == Some(json!("complete")),
                move |_| {
                    timed_out_clone.fetch_add(1, Ordering::SeqCst);
                },
            )
            .unwrap();
        assert_eq!(bus.subscription_kind(&session), Some(SubscriptionKind::Timed));

        for n in 0..3 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            bus.publish(&twin_event_frame("org.acme:lamp", json!(n)));
        }
        bus.publish(&twin_event_frame("org.acme:lamp", json!("complete")));

        assert_eq!(
            *received.lock(),
            vec![Some(json!(0)), Some(json!(1)), Some(json!(2))]
        );
        assert!(!bus.unsubscribe(&session));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(timed_out.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_idle_timeout_fires_once() {
        let bus = client_bus("client").unwrap();
        let errors = Arc::new(Mutex::new(Vec::new()));
        let errors_clone = Arc::clone(&errors);

        let session = bus
            .subscribe_for_adaptable_with_timeout(
                twin_events(),
                Duration::from_millis(100),
                |_| {},
                |_| false,
                move |error| errors_clone.lock().push(error),
            )
            .unwrap();

        for _ in 0..3 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            bus.publish(&twin_event_frame("org.acme:lamp", json!({})));
        }

        tokio::time::sleep(Duration::from_millis(101)).await;
        tokio::time::sleep(Duration::from_millis(500)).await;

        let errors = errors.lock();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], BusError::IdleTimeout { id, .. } if id == session));
        assert!(!bus.unsubscribe(&session));
    }

    // =============================================================================
    // TAKEOVER
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_exclusive_takeover() {
        let bus = client_bus("client").unwrap();
        let old_session = Arc::new(AtomicUsize::new(0));
        let old_clone = Arc::clone(&old_session);
        let old = bus.subscribe_for_adaptable(twin_events(), move |_| {
            old_clone.fetch_add(1, Ordering::SeqCst);
        });
        let pending_ack = bus.subscribe_once_for_string(
            Classification::for_string("START-SEND-EVENTS:ACK"),
            Duration::from_secs(10),
        );

        let commands = Arc::new(AtomicUsize::new(0));
        let commands_clone = Arc::clone(&commands);
        let takeover = bus.subscribe_for_adaptable_exclusively(
            Classification::for_topic_kind("things/live/commands"),
            move |_| {
                commands_clone.fetch_add(1, Ordering::SeqCst);
            },
        );

        assert!(!bus.is_subscribed(&old));
        assert_eq!(pending_ack.await, Err(BusError::Evicted { by: takeover }));

        bus.publish(&twin_event_frame("org.acme:lamp", json!({})));
        bus.publish(&live_command_frame("org.acme:lamp", "modify", Some("c-1"), &[]));

        assert_eq!(old_session.load(Ordering::SeqCst), 0);
        assert_eq!(commands.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscription_count(), 1);
    }
}
