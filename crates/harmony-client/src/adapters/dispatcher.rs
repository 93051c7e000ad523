//! Stream dispatcher: the single entry point for inbound stanzas.
//!
//! Every stanza first has its push event (if recognized) published on the
//! bus, then goes through the pending-request registry. A stanza can do both:
//! `startActivityFinished` notifies subscribers and answers `startactivity`.

use crate::domain::codec::decode_encoded;
use crate::domain::{DispatchOutcome, PendingRequestRegistry, TransportError};
use crate::ports::StanzaSource;
use shared_bus::{event_types, EventPublisher, HubEvent, InMemoryEventBus};
use shared_types::{names, Stanza};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// First pause after a failed receive.
const RECEIVE_RETRY_BASE_DELAY_MS: u64 = 50;

/// Longest pause between receive attempts.
const MAX_RECEIVE_RETRY_DELAY_MS: u64 = 5_000;

/// Routes inbound stanzas to subscribers and pending requests.
#[derive(Clone)]
pub struct StreamDispatcher {
    registry: Arc<PendingRequestRegistry>,
    bus: Arc<InMemoryEventBus>,
}

impl StreamDispatcher {
    pub fn new(registry: Arc<PendingRequestRegistry>, bus: Arc<InMemoryEventBus>) -> Self {
        Self { registry, bus }
    }

    /// Handle one inbound stanza. Called in delivery order.
    pub async fn on_stanza(&self, stanza: &Stanza) -> DispatchOutcome {
        if let Some(event) = recognized_event(stanza) {
            let event_type = event.event_type();
            let receivers = self.bus.publish(event).await;
            debug!(event_type, receivers, "Published hub event");
        }

        self.registry.dispatch(stanza)
    }

    /// Pump a stanza source until it closes.
    ///
    /// Consecutive receive failures back off exponentially; a successful
    /// receive resets the delay.
    pub async fn run(self, source: Arc<dyn StanzaSource>) {
        let mut failures: u32 = 0;
        loop {
            match source.receive().await {
                Ok(stanza) => {
                    failures = 0;
                    self.on_stanza(&stanza).await;
                }
                Err(TransportError::ChannelClosed) => {
                    debug!("Stanza source closed, stopping dispatcher");
                    break;
                }
                Err(e) => {
                    let delay = receive_retry_delay(failures);
                    failures = failures.saturating_add(1);
                    error!(
                        error = %e,
                        failures,
                        retry_in_ms = delay.as_millis() as u64,
                        "Error receiving stanza"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

fn receive_retry_delay(failures: u32) -> Duration {
    Duration::from_millis(std::cmp::min(
        RECEIVE_RETRY_BASE_DELAY_MS.saturating_mul(1 << failures.min(10)),
        MAX_RECEIVE_RETRY_DELAY_MS,
    ))
}

/// Decode a push event the bus knows about. Unknown types yield `None`.
fn recognized_event(stanza: &Stanza) -> Option<HubEvent> {
    let event = stanza.child(names::EVENT)?;
    let event_type = event.attr(names::TYPE)?;
    let text = event.text().unwrap_or_default();

    match event_type {
        event_types::STATE_DIGEST => match serde_json::from_str(text) {
            Ok(digest) => Some(HubEvent::StateDigest(digest)),
            Err(e) => {
                warn!(event_type, error = %e, "Malformed state digest");
                None
            }
        },
        event_types::START_ACTIVITY_FINISHED => match decode_encoded(text) {
            Ok(fields) => Some(HubEvent::ActivityFinished(fields)),
            Err(e) => {
                warn!(event_type, error = %e, "Malformed activity event");
                None
            }
        },
        _ => {
            debug!(event_type, "Ignoring unrecognized hub event");
            None
        }
    }
}
