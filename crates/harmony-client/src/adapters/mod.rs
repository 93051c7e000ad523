//! Adapters layer: the in-memory stanza stream and the inbound dispatcher.

pub mod channel;
pub mod dispatcher;

pub use channel::{channel_transport, ChannelTransport, HubPeer};
pub use dispatcher::StreamDispatcher;
