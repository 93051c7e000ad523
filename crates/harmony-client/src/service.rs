//! Harmony client service - the request façade and hub API.
//!
//! Builds command stanzas, registers them with the pending-request registry
//! and sends them through the transport. Replies come back through the
//! [`StreamDispatcher`], which `connect` runs as a background task.

use crate::adapters::StreamDispatcher;
use crate::domain::commands::{
    build_command_stanza, hold_action_body, start_activity_body, CONFIG, GET_CURRENT_ACTIVITY,
    HOLD_ACTION, START_ACTIVITY,
};
use crate::domain::{
    cleanup_task, CorrelationId, Encoding, HubConfig, HubError, HubResult, Matcher, Payload,
    PendingReply, PendingRequestRegistry, StatsSnapshot,
};
use crate::ports::{Clock, HarmonyApi, StanzaSource, StanzaTransport, SystemClock};
use async_trait::async_trait;
use harmony_telemetry::command_span;
use parking_lot::Mutex;
use serde_json::Value;
use shared_bus::{EventFilter, EventStream, EventTopic, InMemoryEventBus, Subscription};
use shared_types::EncodedMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};

/// Client for one hub connection.
pub struct HarmonyClient {
    config: HubConfig,
    registry: Arc<PendingRequestRegistry>,
    bus: Arc<InMemoryEventBus>,
    transport: Arc<dyn StanzaTransport>,
    clock: Arc<dyn Clock>,
    /// Dispatcher and cleanup tasks spawned by `connect`
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl HarmonyClient {
    /// Create a client without background tasks.
    ///
    /// Inbound stanzas must be fed through [`HarmonyClient::dispatcher`].
    pub fn new(config: HubConfig, transport: Arc<dyn StanzaTransport>) -> HubResult<Self> {
        config.validate()?;

        let registry = Arc::new(PendingRequestRegistry::new(config.request_timeout()));
        let bus = Arc::new(InMemoryEventBus::with_capacity(
            config.event_channel_capacity,
        ));

        Ok(Self {
            config,
            registry,
            bus,
            transport,
            clock: Arc::new(SystemClock),
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Create a client and start dispatching stanzas from `source`.
    ///
    /// Also starts the expired-request sweep when a request timeout is
    /// configured. Must be called inside a Tokio runtime.
    pub fn connect(
        config: HubConfig,
        transport: Arc<dyn StanzaTransport>,
        source: Arc<dyn StanzaSource>,
    ) -> HubResult<Self> {
        let client = Self::new(config, transport)?;

        let mut tasks = Vec::with_capacity(2);
        tasks.push(tokio::spawn(client.dispatcher().run(source)));

        if let Some(timeout) = client.config.request_timeout() {
            let registry = Arc::clone(&client.registry);
            let interval = client.config.cleanup_interval();
            tasks.push(tokio::spawn(cleanup_task(registry, interval)));
            debug!(timeout_ms = timeout.as_millis() as u64, "Request timeouts enabled");
        }

        *client.tasks.lock() = tasks;
        info!(recipient = %client.config.recipient, "Harmony client connected");
        Ok(client)
    }

    /// Replace the clock used for `startactivity` timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Dispatcher bound to this client's registry and event bus.
    pub fn dispatcher(&self) -> StreamDispatcher {
        StreamDispatcher::new(Arc::clone(&self.registry), Arc::clone(&self.bus))
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Send a command and return a handle to its decoded reply.
    ///
    /// Without a custom matcher the reply is the stanza echoing the
    /// command's correlation id. If the send fails nothing stays registered.
    pub async fn send_command(
        &self,
        command: &str,
        body: Option<&str>,
        encoding: Encoding,
        matcher: Option<Matcher>,
    ) -> HubResult<PendingReply> {
        let id = CorrelationId::new();
        let span = command_span!(command, correlation_id = %id);

        async move {
            let stanza = build_command_stanza(&self.config, &id, command, body);
            let matcher = matcher.unwrap_or(Matcher::Id(id));

            // Registered before sending so a fast reply cannot slip past.
            let reply = self
                .registry
                .register_with_id(id, matcher, encoding, command, None);

            if let Err(e) = self.transport.send(stanza).await {
                self.registry.discard(&id);
                warn!(error = %e, "Failed to send hub command");
                return Err(HubError::Transport(e));
            }

            debug!(%encoding, "Sent hub command");
            Ok(reply)
        }
        .instrument(span)
        .await
    }

    /// Send a command and wait for its decoded reply.
    pub async fn request(
        &self,
        command: &str,
        body: Option<&str>,
        encoding: Encoding,
        matcher: Option<Matcher>,
    ) -> HubResult<Payload> {
        self.send_command(command, body, encoding, matcher)
            .await?
            .await
    }

    /// Send a command that expects no reply.
    pub async fn notify(&self, command: &str, body: Option<&str>) -> HubResult<()> {
        let id = CorrelationId::new();
        let stanza = build_command_stanza(&self.config, &id, command, body);
        self.transport.send(stanza).await?;
        debug!(command, correlation_id = %id, "Sent hub notification");
        Ok(())
    }

    /// Subscribe to hub push events.
    ///
    /// Only events published after this call are received.
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.bus.subscribe(filter)
    }

    /// Stream of state digests pushed by the hub.
    pub fn state_digests(&self) -> EventStream {
        self.bus
            .event_stream(EventFilter::topics(vec![EventTopic::StateDigest]))
    }

    pub fn pending_count(&self) -> usize {
        self.registry.pending_count()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.registry.stats().snapshot()
    }

    fn abort_tasks(&self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }
}

fn expect_encoded(payload: Payload) -> HubResult<EncodedMap> {
    match payload {
        Payload::Encoded(map) => Ok(map),
        _ => Err(HubError::decode(Encoding::Encoded, "reply was not encoded")),
    }
}

#[async_trait]
impl HarmonyApi for HarmonyClient {
    async fn get_current_activity(&self) -> HubResult<String> {
        let payload = self
            .request(GET_CURRENT_ACTIVITY, None, Encoding::Encoded, None)
            .await?;
        payload
            .field("result")
            .map(str::to_string)
            .ok_or(HubError::MissingField("result"))
    }

    async fn start_activity(&self, activity_id: &str) -> HubResult<EncodedMap> {
        let body = start_activity_body(activity_id, self.clock.now_millis());
        info!(activity_id, "Starting activity");

        let payload = self
            .request(
                START_ACTIVITY,
                Some(&body),
                Encoding::Encoded,
                Some(Matcher::activity_finished(activity_id)),
            )
            .await?;
        expect_encoded(payload)
    }

    async fn get_available_commands(&self) -> HubResult<Value> {
        match self.request(CONFIG, None, Encoding::Json, None).await? {
            Payload::Json(config) => Ok(config),
            _ => Err(HubError::decode(Encoding::Json, "reply was not JSON")),
        }
    }

    async fn execute_device_command(
        &self,
        kind: &str,
        device_id: &str,
        command: &str,
    ) -> HubResult<()> {
        let body = hold_action_body(kind, device_id, command);
        self.notify(HOLD_ACTION, Some(&body)).await
    }

    async fn end(&self) {
        info!("Closing harmony client");
        self.transport.close().await;
        self.abort_tasks();

        let rejected = self.registry.reject_all(HubError::Closed);
        if rejected > 0 {
            debug!(rejected, "Rejected outstanding requests on close");
        }
    }
}

impl Drop for HarmonyClient {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}
