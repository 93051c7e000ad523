//! # Request/Reply Flows
//!
//! Drives the client against [`SimulatedHub`] with many requests in flight.
//! The hub answers batched commands in shuffled order, so every assertion
//! here depends on replies being paired by correlation id, not by arrival.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{connected_pair, reply_to, sample_config};
    use harmony_client::domain::commands;
    use harmony_client::{
        channel_transport, Encoding, HarmonyApi, HarmonyClient, HubConfig, HubError, Matcher,
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    // =============================================================================
    // HUB API
    // =============================================================================

    #[tokio::test]
    async fn test_power_cycle() {
        let (client, hub) = connected_pair(HubConfig::default());

        assert!(client.is_off().await.unwrap());

        let finished = client.start_activity("7596992").await.unwrap();
        assert_eq!(finished.get("activityId"), Some("7596992"));
        assert_eq!(finished.get("errorString"), Some("OK"));
        assert_eq!(client.get_current_activity().await.unwrap(), "7596992");
        assert!(!client.is_off().await.unwrap());

        let finished = client.turn_off().await.unwrap();
        assert_eq!(finished.get("activityId"), Some("-1"));
        assert!(client.is_off().await.unwrap());

        assert_eq!(hub.state().current_activity, "-1");
        assert_eq!(client.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_config_queries() {
        let (client, _hub) = connected_pair(HubConfig::default());

        let config = client.get_available_commands().await.unwrap();
        assert_eq!(config, sample_config());

        let activities = client.get_activities().await.unwrap();
        assert_eq!(activities.as_array().map(Vec::len), Some(2));

        let devices = client.get_devices().await.unwrap();
        assert_eq!(devices[0]["label"], "TV");
    }

    #[tokio::test]
    async fn test_device_commands_reach_hub() {
        let (client, hub) = connected_pair(HubConfig::default());

        client
            .execute_device_command("IRCommand", "123", "VolumeUp")
            .await
            .unwrap();
        client
            .execute_device_command("IRCommand", "123", "VolumeDown")
            .await
            .unwrap();

        // A request/reply round trip guarantees the hub has processed both presses.
        client.get_current_activity().await.unwrap();

        let presses = hub.state().presses;
        assert_eq!(presses.len(), 2);
        assert!(presses.iter().any(|p| p.contains(r#""command"::"VolumeUp""#)));
        assert!(presses.iter().all(|p| p.ends_with(":status=press")));
        assert_eq!(client.pending_count(), 0);
    }

    // =============================================================================
    // CORRELATION UNDER CONCURRENCY
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_mixed_requests() {
        let (client, _hub) = connected_pair(HubConfig::default());

        let mut handles = Vec::new();
        for i in 0..50 {
            let client = Arc::clone(&client);
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    // Encoded reply; a JSON reply here would fail to decode.
                    client.get_current_activity().await.map(|_| ())
                } else {
                    // JSON reply; an encoded reply here would fail to decode.
                    client.get_available_commands().await.map(|_| ())
                }
            }));
        }

        for handle in handles {
            timeout(Duration::from_secs(5), handle)
                .await
                .expect("request resolved")
                .unwrap()
                .unwrap();
        }
        assert_eq!(client.pending_count(), 0);
        assert_eq!(client.stats().resolved, 50);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_activity_starts_resolve_own_event() {
        let (client, _hub) = connected_pair(HubConfig::default());
        let ids = ["1001", "1002", "1003", "1004"];

        let handles: Vec<_> = ids
            .iter()
            .map(|id| {
                let client = Arc::clone(&client);
                let id = id.to_string();
                tokio::spawn(async move { (id.clone(), client.start_activity(&id).await) })
            })
            .collect();

        for handle in handles {
            let (id, finished) = timeout(Duration::from_secs(5), handle)
                .await
                .expect("activity finished")
                .unwrap();
            assert_eq!(finished.unwrap().get("activityId"), Some(id.as_str()));
        }
        assert_eq!(client.pending_count(), 0);
    }

    // =============================================================================
    // FAILURE PATHS
    // =============================================================================

    #[tokio::test]
    async fn test_wrong_encoding_rejects_only_that_request() {
        let (client, _hub) = connected_pair(HubConfig::default());

        // getCurrentActivity answers `result=-1`, which is not JSON.
        let wrong = client
            .request(commands::GET_CURRENT_ACTIVITY, None, Encoding::Json, None)
            .await;
        assert!(matches!(
            wrong,
            Err(HubError::Decode {
                encoding: Encoding::Json,
                ..
            })
        ));

        assert_eq!(client.get_current_activity().await.unwrap(), "-1");
    }

    #[tokio::test]
    async fn test_end_with_requests_in_flight() {
        let (transport, _peer) = channel_transport(16);
        let transport = Arc::new(transport);
        let client =
            HarmonyClient::connect(HubConfig::default(), transport.clone(), transport).unwrap();

        // Nobody answers on this stream.
        let replies = vec![
            client
                .send_command(commands::GET_CURRENT_ACTIVITY, None, Encoding::Encoded, None)
                .await
                .unwrap(),
            client
                .send_command(
                    commands::START_ACTIVITY,
                    Some("activityId=1:timestamp=0"),
                    Encoding::Encoded,
                    Some(Matcher::activity_finished("1")),
                )
                .await
                .unwrap(),
        ];
        assert_eq!(client.pending_count(), 2);

        client.end().await;

        for reply in replies {
            assert_eq!(reply.await, Err(HubError::Closed));
        }
        assert_eq!(client.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unanswered_request_times_out() {
        let (transport, mut peer) = channel_transport(16);
        let transport = Arc::new(transport);
        let config = HubConfig {
            request_timeout_ms: Some(1_000),
            cleanup_interval_ms: 100,
            ..HubConfig::default()
        };
        let client = HarmonyClient::connect(config, transport.clone(), transport).unwrap();

        let pending = client
            .send_command(commands::CONFIG, None, Encoding::Json, None)
            .await
            .unwrap();
        let answered = client
            .send_command(commands::GET_CURRENT_ACTIVITY, None, Encoding::Encoded, None)
            .await
            .unwrap();

        let _config_request = peer.next_sent().await.unwrap();
        let activity_request = peer.next_sent().await.unwrap();
        peer.deliver(reply_to(&activity_request, "result=-1"))
            .await
            .unwrap();

        assert_eq!(answered.await.unwrap().field("result"), Some("-1"));
        assert!(matches!(
            pending.await,
            Err(HubError::Timeout { ref command, .. }) if command == commands::CONFIG
        ));
        assert_eq!(client.stats().timeouts, 1);
    }
}
