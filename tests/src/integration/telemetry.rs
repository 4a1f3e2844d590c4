//! # Logging Under Dispatch
//!
//! The client installs structured logging once at startup; dispatch then
//! emits its debug and warn events through that subscriber.

#[cfg(test)]
mod tests {
    use crate::fixtures::{client_bus, twin_event_frame};
    use serde_json::json;
    use std::time::Duration;
    use twin_bus::Classification;
    use twin_telemetry::{init_logging, TelemetryConfig, TelemetryError};

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_with_logging_installed() {
        let config = TelemetryConfig {
            log_level: "twin_bus=debug,twin_live=debug,warn".to_string(),
            console_output: false,
            ..TelemetryConfig::for_service("twin-tests")
        };
        init_logging(&config).unwrap();

        let bus = client_bus("logged").unwrap();
        let ack = bus.subscribe_once_for_string(
            Classification::for_string("START-SEND-EVENTS:ACK"),
            Duration::from_secs(1),
        );
        bus.publish("START-SEND-EVENTS:ACK");
        bus.publish(&twin_event_frame("org.acme:lamp", json!({})));
        bus.publish("garbage");

        assert_eq!(ack.await.unwrap(), "START-SEND-EVENTS:ACK");
        assert_eq!(bus.stats().unhandled, 2);

        assert!(matches!(
            init_logging(&config),
            Err(TelemetryError::AlreadyInitialized)
        ));
    }
}
