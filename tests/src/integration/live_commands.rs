//! # Live Command Flow
//!
//! A live command arrives as a text frame, travels through the bus to the
//! application handler, and leaves again as acknowledgements plus a command
//! response:
//!
//! ```text
//! frame ──publish──→ [AdaptableBus] ──things/live/commands──→ handler
//!                                                               │
//!                          ┌────────────────────────────────────┤
//!                          ↓                                    ↓
//!               Acknowledgement per label              CommandResponse
//!                          └──────────→ SignalPublisher ←───────┘
//! ```
//!
//! The requesting side is simulated by a second bus that receives the
//! outbound signals and resolves a one-time subscription by correlation id.

#[cfg(test)]
mod tests {
    use crate::fixtures::{channel_publisher, client_bus, drain, live_command_frame};
    use std::time::Duration;
    use twin_bus::{BusError, Classification};
    use twin_live::{
        live_commands, subscribe_live_commands, Acknowledgeable, LiveCommand,
    };
    use twin_types::{AcknowledgementLabel, HttpStatus, Signal};

    // =============================================================================
    // HAPPY PATH
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_command_is_acknowledged_and_answered() {
        let device = client_bus("device").unwrap();
        let (publisher, mut outbound) = channel_publisher();

        subscribe_live_commands(&device, live_commands(), publisher.clone(), move |command| {
            command.handle_acknowledgement_requests(|handles| {
                for handle in handles {
                    handle.acknowledge(HttpStatus::OK);
                }
            });
            publisher(command.answer().response(HttpStatus::NO_CONTENT).into());
        });

        device.publish(&live_command_frame(
            "org.acme:lamp",
            "modify",
            Some("c-100"),
            &["custom-a", "custom-b"],
        ));

        let signals = drain(&mut outbound);
        assert_eq!(signals.len(), 3);

        let labels: Vec<_> = signals
            .iter()
            .filter_map(|signal| match signal {
                Signal::Acknowledgement(ack) => Some(ack.label.as_str().to_string()),
                Signal::CommandResponse(_) => None,
            })
            .collect();
        assert_eq!(labels, vec!["custom-a", "custom-b"]);

        match &signals[2] {
            Signal::CommandResponse(response) => {
                assert_eq!(response.status, HttpStatus::NO_CONTENT);
                assert_eq!(response.topic.action(), Some("modify"));
            }
            other => panic!("expected a command response, got {other:?}"),
        }
        assert!(signals
            .iter()
            .all(|signal| signal.headers().correlation_id() == Some("c-100")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_requester_receives_response_by_correlation_id() {
        let device = client_bus("device").unwrap();
        let requester = client_bus("requester").unwrap();
        let (publisher, mut outbound) = channel_publisher();

        subscribe_live_commands(&device, live_commands(), publisher.clone(), move |command| {
            let response = command
                .answer()
                .response_with_payload(HttpStatus::OK, serde_json::json!({"on": true}));
            publisher(Signal::CommandResponse(response));
        });

        let awaiting = requester.subscribe_once_for_adaptable(
            Classification::for_correlation_id("c-200"),
            Duration::from_secs(5),
        );

        device.publish(&live_command_frame("org.acme:lamp", "retrieve", Some("c-200"), &[]));

        // Loop the outbound signals back as frames on the requesting side.
        for signal in drain(&mut outbound) {
            let frame = serde_json::to_string(&signal.to_adaptable()).unwrap();
            requester.publish(&frame);
        }

        let response = awaiting.await.unwrap();
        assert_eq!(response.status, Some(HttpStatus::OK));
        assert_eq!(response.value, Some(serde_json::json!({"on": true})));
    }

    // =============================================================================
    // SELECTIVE ACKNOWLEDGEMENT
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_only_requested_labels_are_acknowledged() {
        let device = client_bus("device").unwrap();
        let (publisher, mut outbound) = channel_publisher();
        let custom = AcknowledgementLabel::new("custom-a").unwrap();
        let unrequested = AcknowledgementLabel::new("custom-z").unwrap();

        subscribe_live_commands(&device, live_commands(), publisher, move |command| {
            command.handle_acknowledgement_request(&unrequested, |handle| {
                handle.acknowledge(HttpStatus::OK);
            });
            command.handle_acknowledgement_request(&custom, |handle| {
                handle.acknowledge(HttpStatus::ACCEPTED);
            });
        });

        device.publish(&live_command_frame("org.acme:lamp", "modify", Some("c-1"), &["custom-a"]));
        device.publish(&live_command_frame("org.acme:lamp", "modify", Some("c-2"), &[]));

        let signals = drain(&mut outbound);
        assert_eq!(signals.len(), 1);
        let Signal::Acknowledgement(ack) = &signals[0] else {
            panic!("expected an acknowledgement");
        };
        assert_eq!(ack.label.as_str(), "custom-a");
        assert_eq!(ack.status, HttpStatus::ACCEPTED);
        assert_eq!(ack.headers.correlation_id(), Some("c-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_requests_yield_one_handle() {
        let device = client_bus("device").unwrap();
        let (publisher, mut outbound) = channel_publisher();

        subscribe_live_commands(&device, live_commands(), publisher, |command| {
            assert_eq!(command.live_command().entity_id().to_string(), "org.acme:lamp");
            command.handle_acknowledgement_requests(|handles| {
                assert_eq!(handles.len(), 2);
                for handle in handles {
                    handle.acknowledge(HttpStatus::OK);
                }
            });
        });

        device.publish(&live_command_frame(
            "org.acme:lamp",
            "modify",
            Some("c-3"),
            &["custom-b", "custom-a", "custom-b"],
        ));
        assert_eq!(drain(&mut outbound).len(), 2);
    }

    // =============================================================================
    // TIMEOUT HANDLING
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_unanswered_command_times_out_on_requester() {
        let requester = client_bus("requester").unwrap();
        let awaiting = requester.subscribe_once_for_adaptable(
            Classification::for_correlation_id("c-lost"),
            Duration::from_millis(500),
        );

        let error = awaiting.await.unwrap_err();
        assert!(matches!(error, BusError::Timeout { .. }));
        assert_eq!(requester.stats().timeouts, 1);
    }
}
