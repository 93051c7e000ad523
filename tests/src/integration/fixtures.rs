//! # Test Fixtures
//!
//! [`SimulatedHub`] sits on the hub side of a [`HubPeer`] and answers the
//! commands the real hub understands. Commands that arrive together are
//! answered in shuffled order, so replies routinely overtake each other.

use harmony_client::domain::{commands, decode_encoded};
use harmony_client::{channel_transport, HarmonyClient, HubConfig, HubPeer};
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use serde_json::{json, Value};
use shared_bus::event_types;
use shared_types::{names, Stanza};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Mutable hub state visible to tests.
#[derive(Debug, Clone)]
pub struct HubState {
    pub current_activity: String,
    /// Raw `holdAction` bodies in arrival order
    pub presses: Vec<String>,
    pub commands_seen: usize,
}

/// A scripted hub answering over an in-memory stream.
pub struct SimulatedHub {
    state: Arc<Mutex<HubState>>,
    task: JoinHandle<()>,
}

impl SimulatedHub {
    /// Start serving `peer` with the given hub configuration document.
    pub fn spawn(peer: HubPeer, config: Value) -> Self {
        let state = Arc::new(Mutex::new(HubState {
            current_activity: commands::OFF_ACTIVITY_ID.to_string(),
            presses: Vec::new(),
            commands_seen: 0,
        }));
        let task = tokio::spawn(serve(peer, config, Arc::clone(&state)));
        Self { state, task }
    }

    pub fn state(&self) -> HubState {
        self.state.lock().clone()
    }

    /// Wait until the client side closed its stream.
    pub async fn finished(self) {
        let _ = self.task.await;
    }
}

/// Configuration document with two activities and one device.
pub fn sample_config() -> Value {
    json!({
        "activity": [
            {"id": "-1", "label": "PowerOff"},
            {"id": "7596992", "label": "Watch TV"},
        ],
        "device": [
            {"id": "123", "label": "TV", "controlGroup": [{"name": "Volume"}]},
        ],
    })
}

/// A connected client and the simulated hub behind it.
pub fn connected_pair(config: HubConfig) -> (Arc<HarmonyClient>, SimulatedHub) {
    let (transport, peer) = channel_transport(256);
    let transport = Arc::new(transport);
    let client = HarmonyClient::connect(config, transport.clone(), transport)
        .expect("valid client config");
    (Arc::new(client), SimulatedHub::spawn(peer, sample_config()))
}

/// Reply stanza echoing the request id.
pub fn reply_to(request: &Stanza, payload: &str) -> Stanza {
    Stanza::builder(names::IQ)
        .attr(names::TYPE, "get")
        .attr(names::ID, request.id().unwrap_or_default())
        .child(Stanza::builder(names::OA).text(payload).build())
        .build()
}

/// Push event stanza.
pub fn hub_event(event_type: &str, text: &str) -> Stanza {
    Stanza::builder(names::MESSAGE)
        .child(
            Stanza::builder(names::EVENT)
                .attr(names::TYPE, event_type)
                .text(text)
                .build(),
        )
        .build()
}

fn command_of(request: &Stanza) -> Option<&str> {
    let mime = request.child(names::OA)?.attr("mime")?;
    mime.rsplit_once('?').map(|(_, command)| command)
}

async fn serve(mut peer: HubPeer, config: Value, state: Arc<Mutex<HubState>>) {
    while let Some(first) = peer.next_sent().await {
        let mut batch = vec![first];
        while let Some(next) = peer.try_next_sent() {
            batch.push(next);
        }
        batch.shuffle(&mut rand::thread_rng());

        // The whole batch is applied before anything is answered.
        let outgoing: Vec<Stanza> = batch
            .iter()
            .flat_map(|request| respond(request, &config, &state))
            .collect();
        for stanza in outgoing {
            if peer.deliver(stanza).await.is_err() {
                return;
            }
        }
    }
}

fn respond(request: &Stanza, config: &Value, state: &Mutex<HubState>) -> Vec<Stanza> {
    let mut state = state.lock();
    state.commands_seen += 1;
    let body = request.child_text(names::OA).unwrap_or_default();

    match command_of(request) {
        Some(commands::GET_CURRENT_ACTIVITY) => {
            vec![reply_to(request, &format!("result={}", state.current_activity))]
        }
        Some(commands::CONFIG) => vec![reply_to(request, &config.to_string())],
        Some(commands::START_ACTIVITY) => {
            let Some(activity_id) = decode_encoded(body)
                .ok()
                .and_then(|fields| fields.get("activityId").map(str::to_string))
            else {
                return Vec::new();
            };
            state.current_activity.clone_from(&activity_id);

            let digest = json!({"activityId": activity_id, "activityStatus": 2});
            vec![
                reply_to(request, ""),
                hub_event(event_types::STATE_DIGEST, &digest.to_string()),
                hub_event(
                    event_types::START_ACTIVITY_FINISHED,
                    &format!("activityId={activity_id}:errorCode=200:errorString=OK"),
                ),
            ]
        }
        Some(commands::HOLD_ACTION) => {
            state.presses.push(body.to_string());
            Vec::new()
        }
        _ => Vec::new(),
    }
}
