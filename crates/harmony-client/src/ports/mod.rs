//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - API for callers of the client
//! - Driven Ports (outbound) - the stanza stream and the clock

pub mod inbound;
pub mod outbound;

pub use inbound::HarmonyApi;
pub use outbound::{Clock, StanzaSource, StanzaTransport, SystemClock};
