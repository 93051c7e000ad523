//! # Harmony Client
//!
//! Asynchronous request/response correlation for the Logitech Harmony hub
//! stanza stream.
//!
//! The hub's XMPP stream has no request/reply framing: replies arrive out of
//! order and interleave with unsolicited push events. This crate pairs every
//! outbound command with the one inbound stanza that answers it, decodes
//! that stanza's payload, and routes push events to subscribers.
//!
//! # Architecture
//!
//! ```text
//!  caller ──► HarmonyClient ──build/register──► PendingRequestRegistry
//!                  │                                     ▲
//!                  └──send──► StanzaTransport            │ dispatch
//!                                                        │
//!  hub ──► StanzaSource ──► StreamDispatcher ────────────┘
//!                                 │
//!                                 └──publish──► InMemoryEventBus ──► subscribers
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use harmony_client::{channel_transport, HarmonyApi, HarmonyClient, HubConfig};
//! use std::sync::Arc;
//!
//! let (transport, peer) = channel_transport(64);
//! let transport = Arc::new(transport);
//! let client = HarmonyClient::connect(HubConfig::default(), transport.clone(), transport)?;
//! // bridge `peer` to the real XMPP connection
//! if client.is_off().await? {
//!     client.start_activity("7596992").await?;
//! }
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports for public API
pub use adapters::{channel_transport, ChannelTransport, HubPeer, StreamDispatcher};
pub use domain::{
    CorrelationId, DispatchOutcome, Encoding, HubConfig, HubError, HubResult, Matcher, Payload,
    PendingReply, PendingRequestRegistry, StatsSnapshot, TransportError,
};
pub use ports::{Clock, HarmonyApi, StanzaSource, StanzaTransport, SystemClock};
pub use service::HarmonyClient;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
