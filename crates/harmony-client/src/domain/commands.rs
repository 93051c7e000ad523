//! Hub command names and outbound stanza construction.

use crate::domain::codec::encode;
use crate::domain::config::HubConfig;
use crate::domain::correlation::CorrelationId;
use serde_json::Value;
use shared_types::{names, EncodedMap, Stanza};

/// Reports the running activity as `result=<activityId>`.
pub const GET_CURRENT_ACTIVITY: &str = "getCurrentActivity";
/// Returns the full hub configuration as JSON.
pub const CONFIG: &str = "config";
pub const START_ACTIVITY: &str = "startactivity";
/// Presses a device button.
pub const HOLD_ACTION: &str = "holdAction";

/// Activity id the hub reports while everything is off.
pub const OFF_ACTIVITY_ID: &str = "-1";

/// `<iq type="get" id=.. to=..><oa xmlns=.. mime="ns?command">body</oa></iq>`
pub fn build_command_stanza(
    config: &HubConfig,
    id: &CorrelationId,
    command: &str,
    body: Option<&str>,
) -> Stanza {
    let oa = Stanza::builder(names::OA)
        .attr("xmlns", config.xmlns.as_str())
        .attr("mime", format!("{}?{}", config.command_namespace, command))
        .maybe_text(body)
        .build();

    Stanza::builder(names::IQ)
        .attr(names::TYPE, "get")
        .attr(names::ID, id.to_string())
        .attr("to", config.recipient.as_str())
        .child(oa)
        .build()
}

/// `activityId=<id>:timestamp=<epoch-ms>`
pub fn start_activity_body(activity_id: &str, timestamp_ms: u64) -> String {
    let body: EncodedMap = [
        ("activityId", activity_id.to_string()),
        ("timestamp", timestamp_ms.to_string()),
    ]
    .into_iter()
    .collect();
    encode(&body)
}

/// Button-press descriptor for `holdAction`.
///
/// The action value is a JSON object, so every colon in it is doubled.
pub fn hold_action_body(kind: &str, device_id: &str, command: &str) -> String {
    // Field order matters to the hub, so the object is written by hand.
    let action = format!(
        r#"{{"type":{},"deviceId":{},"command":{}}}"#,
        Value::from(kind),
        Value::from(device_id),
        Value::from(command),
    );
    let body: EncodedMap = [("action", action), ("status", "press".to_string())]
        .into_iter()
        .collect();
    encode(&body)
}
