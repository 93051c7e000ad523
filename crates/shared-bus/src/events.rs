//! # Hub Events
//!
//! Defines the recognized push events that flow through the shared bus.
//! Event types the hub sends that are not listed here are not published.

use serde::{Deserialize, Serialize};
use shared_types::EncodedMap;

/// Wire values of the `type` attribute on recognized `event` children.
pub mod event_types {
    /// Hub state snapshot, JSON payload.
    pub const STATE_DIGEST: &str = "connect.stateDigest?notify";
    /// Activity start confirmation, encoded payload.
    pub const START_ACTIVITY_FINISHED: &str = "harmony.engine?startActivityFinished";
}

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HubEvent {
    /// The hub pushed its current state.
    StateDigest(serde_json::Value),

    /// The hub finished starting an activity.
    /// Carries `activityId`, `errorCode` and `errorString`.
    ActivityFinished(EncodedMap),
}

impl HubEvent {
    /// Get the topic for this event.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::StateDigest(_) => EventTopic::StateDigest,
            Self::ActivityFinished(_) => EventTopic::Activity,
        }
    }

    /// The wire event type this event was decoded from.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::StateDigest(_) => event_types::STATE_DIGEST,
            Self::ActivityFinished(_) => event_types::START_ACTIVITY_FINISHED,
        }
    }
}

/// Event topics for filtering subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Subscribe to all topics.
    All,
    /// State digest pushes.
    StateDigest,
    /// Activity lifecycle events.
    Activity,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &HubEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn finished() -> HubEvent {
        HubEvent::ActivityFinished([("activityId", "7596992")].into_iter().collect())
    }

    #[test]
    fn test_event_topic_mapping() {
        let digest = HubEvent::StateDigest(json!({"activityId": "-1"}));
        assert_eq!(digest.topic(), EventTopic::StateDigest);
        assert_eq!(digest.event_type(), "connect.stateDigest?notify");
        assert_eq!(finished().topic(), EventTopic::Activity);
        assert_eq!(
            finished().event_type(),
            "harmony.engine?startActivityFinished"
        );
    }

    #[test]
    fn test_filter_all() {
        let filter = EventFilter::all();
        assert!(filter.matches(&finished()));
        assert!(EventFilter::topics(vec![EventTopic::All]).matches(&finished()));
    }

    #[test]
    fn test_filter_by_topic() {
        let filter = EventFilter::topics(vec![EventTopic::StateDigest]);
        assert!(filter.matches(&HubEvent::StateDigest(json!({}))));
        assert!(!filter.matches(&finished()));
    }
}
