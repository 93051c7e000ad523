//! # Notification Flows
//!
//! Push events from the hub reach bus subscribers exactly once per arrival,
//! independent of how many requests are pending.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{connected_pair, hub_event};
    use futures::StreamExt;
    use harmony_client::{channel_transport, HarmonyApi, HarmonyClient, HubConfig};
    use harmony_telemetry::{init_logging, TelemetryConfig};
    use serde_json::json;
    use shared_bus::{event_types, EventFilter, EventTopic, HubEvent};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_activity_start_notifies_every_subscriber() {
        let (client, _hub) = connected_pair(HubConfig::default());
        let mut digests = client.state_digests();
        let mut everything = client.subscribe(EventFilter::all());
        let mut activity = client.subscribe(EventFilter::topics(vec![EventTopic::Activity]));

        client.start_activity("7596992").await.unwrap();

        let digest = timeout(Duration::from_secs(1), digests.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            digest,
            HubEvent::StateDigest(json!({"activityId": "7596992", "activityStatus": 2}))
        );

        let first = everything.recv().await.unwrap();
        let second = everything.recv().await.unwrap();
        assert_eq!(first.event_type(), event_types::STATE_DIGEST);
        assert_eq!(second.event_type(), event_types::START_ACTIVITY_FINISHED);

        match activity.recv().await {
            Some(HubEvent::ActivityFinished(fields)) => {
                assert_eq!(fields.get("activityId"), Some("7596992"));
                assert_eq!(fields.get("errorCode"), Some("200"));
            }
            other => panic!("expected activity event, got {other:?}"),
        }
        assert_eq!(activity.try_recv().unwrap(), None);
    }

    #[tokio::test]
    async fn test_digest_delivered_once_with_pending_requests() {
        let (transport, peer) = channel_transport(16);
        let transport = Arc::new(transport);
        let client =
            HarmonyClient::connect(HubConfig::default(), transport.clone(), transport).unwrap();
        let mut subscription = client.subscribe(EventFilter::all());

        let _pending: Vec<_> = futures::future::try_join_all(
            (0..5).map(|_| {
                client.send_command(
                    "getCurrentActivity",
                    None,
                    harmony_client::Encoding::Encoded,
                    None,
                )
            }),
        )
        .await
        .unwrap();

        peer.deliver(hub_event(event_types::STATE_DIGEST, r#"{"activityId":"-1"}"#))
            .await
            .unwrap();
        peer.deliver(hub_event("harmony.engine?helpdiscretes", "done=1"))
            .await
            .unwrap();
        peer.deliver(hub_event(event_types::STATE_DIGEST, r#"{"activityId":"42"}"#))
            .await
            .unwrap();

        let first = timeout(Duration::from_secs(1), subscription.recv())
            .await
            .unwrap();
        let second = timeout(Duration::from_secs(1), subscription.recv())
            .await
            .unwrap();
        assert_eq!(first, Some(HubEvent::StateDigest(json!({"activityId": "-1"}))));
        assert_eq!(second, Some(HubEvent::StateDigest(json!({"activityId": "42"}))));
        assert_eq!(subscription.try_recv().unwrap(), None);
        assert_eq!(client.pending_count(), 5);
    }

    // The only test in this crate that installs the global subscriber.
    #[tokio::test]
    async fn test_client_runs_with_json_logging() {
        let config = TelemetryConfig {
            json_logs: true,
            log_level: "harmony_client=debug,info".to_string(),
            ..TelemetryConfig::default()
        };
        let guard = init_logging(&config).unwrap();
        assert_eq!(guard.service_name(), "harmony-hub");

        let (client, _hub) = connected_pair(HubConfig::default());
        assert!(client.is_off().await.unwrap());
        tracing::info!(pending = client.pending_count(), "Logged from test");
    }
}
