//! Inbound Ports (Driving Ports)
//!
//! The hub operations applications call. Composite operations are default
//! methods layered on the primitive ones.

use async_trait::async_trait;
use serde_json::Value;
use shared_types::EncodedMap;

use crate::domain::commands::OFF_ACTIVITY_ID;
use crate::domain::{HubError, HubResult};

/// High-level Harmony hub API (Driving Port)
#[async_trait]
pub trait HarmonyApi: Send + Sync {
    /// Id of the running activity. `"-1"` when everything is off.
    async fn get_current_activity(&self) -> HubResult<String>;

    /// Start an activity and wait for the hub's `startActivityFinished` event.
    ///
    /// Returns the decoded event, e.g. `activityId`, `errorCode`, `errorString`.
    async fn start_activity(&self, activity_id: &str) -> HubResult<EncodedMap>;

    /// The full hub configuration (activities, devices and their commands).
    async fn get_available_commands(&self) -> HubResult<Value>;

    /// Press a device button. Fire-and-forget: the hub sends no reply.
    async fn execute_device_command(
        &self,
        kind: &str,
        device_id: &str,
        command: &str,
    ) -> HubResult<()>;

    /// Close the stream and reject every outstanding request.
    async fn end(&self);

    async fn is_off(&self) -> HubResult<bool> {
        let activity = self.get_current_activity().await?;
        let off = activity == OFF_ACTIVITY_ID;
        tracing::debug!(activity = %activity, off, "Checked power state");
        Ok(off)
    }

    async fn turn_off(&self) -> HubResult<EncodedMap> {
        self.start_activity(OFF_ACTIVITY_ID).await
    }

    /// The `activity` member of the hub configuration.
    async fn get_activities(&self) -> HubResult<Value> {
        config_member(self.get_available_commands().await?, "activity")
    }

    /// The `device` member of the hub configuration.
    async fn get_devices(&self) -> HubResult<Value> {
        config_member(self.get_available_commands().await?, "device")
    }
}

fn config_member(mut config: Value, key: &'static str) -> HubResult<Value> {
    config
        .get_mut(key)
        .map(Value::take)
        .ok_or(HubError::MissingField(key))
}
