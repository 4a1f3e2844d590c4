//! # Concurrent Dispatch
//!
//! Many publishers and subscribers on one bus from a multi-threaded runtime.
//! Every frame must be delivered exactly once to each matching durable
//! subscriber, and every one-time subscription must end with exactly one
//! outcome.

#[cfg(test)]
mod tests {
    use crate::fixtures::{client_bus, twin_event_frame};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use twin_bus::Classification;
    use twin_types::{Adaptable, Headers, HttpStatus, TopicPath};

    fn response_frame(correlation_id: &str) -> String {
        let topic: TopicPath = "org.acme/lamp/things/live/commands/retrieve".parse().unwrap();
        let adaptable = Adaptable::new(topic)
            .with_headers(Headers::new().with("correlation-id", correlation_id))
            .with_status(HttpStatus::OK);
        serde_json::to_string(&adaptable).unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_publishers_deliver_every_frame() {
        let bus = client_bus("concurrent").unwrap();
        let delivered = Arc::new(AtomicUsize::new(0));
        let delivered_clone = Arc::clone(&delivered);
        bus.subscribe_for_adaptable(
            Classification::for_topic_kind("things/twin/events"),
            move |_| {
                delivered_clone.fetch_add(1, Ordering::SeqCst);
            },
        );

        let publishers: Vec<_> = (0..8)
            .map(|worker| {
                let bus = bus.clone();
                tokio::spawn(async move {
                    for n in 0..250 {
                        bus.publish(&twin_event_frame("org.acme:lamp", json!([worker, n])));
                    }
                })
            })
            .collect();
        for publisher in publishers {
            publisher.await.unwrap();
        }

        assert_eq!(delivered.load(Ordering::SeqCst), 2000);
        assert_eq!(bus.stats().published, 2000);
        assert_eq!(bus.stats().persistent_deliveries, 2000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_each_get_their_response() {
        let bus = client_bus("concurrent").unwrap();

        let requests: Vec<_> = (0..200)
            .map(|n| {
                let bus = bus.clone();
                tokio::spawn(async move {
                    let correlation_id = format!("req-{n}");
                    let waiter = bus.subscribe_once_for_adaptable(
                        Classification::for_correlation_id(correlation_id.clone()),
                        Duration::from_secs(10),
                    );
                    let responder = bus.clone();
                    let frame = response_frame(&correlation_id);
                    tokio::spawn(async move { responder.publish(&frame) });
                    let response = waiter.await.unwrap();
                    assert_eq!(response.correlation_id(), Some(correlation_id.as_str()));
                })
            })
            .collect();
        for request in requests {
            request.await.unwrap();
        }

        assert_eq!(bus.stats().adaptable_resolutions, 200);
        assert_eq!(bus.subscription_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_unsubscribe_races_resolution() {
        for round in 0..100 {
            let bus = client_bus("race").unwrap();
            let correlation_id = format!("race-{round}");
            let waiter = bus.subscribe_once_for_adaptable(
                Classification::for_correlation_id(correlation_id.clone()),
                Duration::from_secs(10),
            );
            let id = waiter.id();

            let publisher = bus.clone();
            let frame = response_frame(&correlation_id);
            let publish = tokio::spawn(async move { publisher.publish(&frame) });
            let unsubscriber = bus.clone();
            let unsubscribe = tokio::spawn(async move { unsubscriber.unsubscribe(&id) });

            let outcome = waiter.await;
            publish.await.unwrap();
            let removed = unsubscribe.await.unwrap();

            // The unsubscribe took effect exactly when the match did not.
            assert_eq!(outcome.is_err(), removed, "round {round}");
            assert_eq!(bus.stats().adaptable_resolutions, u64::from(!removed));
        }
    }
}
