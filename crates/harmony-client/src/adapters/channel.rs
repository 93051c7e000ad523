//! In-memory stanza stream.
//!
//! [`ChannelTransport`] implements both stream ports over `tokio::sync::mpsc`.
//! The [`HubPeer`] returned alongside it plays the hub: it sees every stanza
//! the client sends and injects inbound ones. Tests drive the client this
//! way, and an embedder can pump a real XMPP connection through the peer.

use crate::domain::TransportError;
use crate::ports::{StanzaSource, StanzaTransport};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::Stanza;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, Notify};
use tracing::debug;

/// Client side of an in-memory stanza stream.
pub struct ChannelTransport {
    /// `None` once closed
    outbound: Mutex<Option<mpsc::Sender<Stanza>>>,
    inbound: tokio::sync::Mutex<mpsc::Receiver<Stanza>>,
    closed: AtomicBool,
    shutdown: Notify,
}

/// Hub side of an in-memory stanza stream.
pub struct HubPeer {
    inbound: mpsc::Sender<Stanza>,
    outbound: mpsc::Receiver<Stanza>,
}

/// Create a connected transport/peer pair. Each direction buffers `capacity` stanzas.
pub fn channel_transport(capacity: usize) -> (ChannelTransport, HubPeer) {
    let (out_tx, out_rx) = mpsc::channel(capacity);
    let (in_tx, in_rx) = mpsc::channel(capacity);

    let transport = ChannelTransport {
        outbound: Mutex::new(Some(out_tx)),
        inbound: tokio::sync::Mutex::new(in_rx),
        closed: AtomicBool::new(false),
        shutdown: Notify::new(),
    };
    let peer = HubPeer {
        inbound: in_tx,
        outbound: out_rx,
    };
    (transport, peer)
}

impl ChannelTransport {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[async_trait]
impl StanzaTransport for ChannelTransport {
    async fn send(&self, stanza: Stanza) -> Result<(), TransportError> {
        let sender = self
            .outbound
            .lock()
            .clone()
            .ok_or(TransportError::ChannelClosed)?;

        sender
            .send(stanza)
            .await
            .map_err(|_| TransportError::SendFailed("hub peer disconnected".into()))
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.outbound.lock().take();
        self.shutdown.notify_waiters();
        debug!("Channel transport closed");
    }
}

#[async_trait]
impl StanzaSource for ChannelTransport {
    async fn receive(&self) -> Result<Stanza, TransportError> {
        // Registered before the flag check so a concurrent close() is not missed.
        let shutdown = self.shutdown.notified();
        if self.is_closed() {
            return Err(TransportError::ChannelClosed);
        }

        let mut inbound = self.inbound.lock().await;
        tokio::select! {
            stanza = inbound.recv() => stanza.ok_or(TransportError::ChannelClosed),
            _ = shutdown => Err(TransportError::ChannelClosed),
        }
    }
}

impl HubPeer {
    /// Push a stanza to the client.
    pub async fn deliver(&self, stanza: Stanza) -> Result<(), TransportError> {
        self.inbound
            .send(stanza)
            .await
            .map_err(|_| TransportError::ChannelClosed)
    }

    /// Next stanza the client sent. `None` once the client closed its side.
    pub async fn next_sent(&mut self) -> Option<Stanza> {
        self.outbound.recv().await
    }

    pub fn try_next_sent(&mut self) -> Option<Stanza> {
        self.outbound.try_recv().ok()
    }
}
