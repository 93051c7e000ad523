//! Outbound Ports (Driven Ports)
//!
//! The client never owns a connection. Whatever speaks XMPP to the hub
//! implements these traits; framing and parsing stay on that side.

use async_trait::async_trait;
use shared_types::Stanza;

use crate::domain::TransportError;

/// Sending half of the stanza stream.
#[async_trait]
pub trait StanzaTransport: Send + Sync {
    /// Send one stanza to the hub.
    async fn send(&self, stanza: Stanza) -> Result<(), TransportError>;

    /// Close the stream. Closing twice is a no-op.
    async fn close(&self);
}

/// Receiving half of the stanza stream.
#[async_trait]
pub trait StanzaSource: Send + Sync {
    /// Next inbound stanza, in delivery order.
    ///
    /// Returns [`TransportError::ChannelClosed`] once the stream has ended.
    async fn receive(&self) -> Result<Stanza, TransportError>;
}

/// Time source trait for testability
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

/// System time implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            // Clock before Unix epoch - return 0 rather than panic
            .unwrap_or(0)
    }
}
