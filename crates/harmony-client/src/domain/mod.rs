//! Domain types for the Harmony client.
//!
//! Codec, match predicates, the pending-request registry, configuration and
//! error handling. Nothing in here touches a transport.

pub mod codec;
pub mod commands;
pub mod config;
pub mod correlation;
pub mod error;
pub mod matcher;
pub mod pending;

// Re-exports for convenience
pub use codec::{decode, decode_encoded, encode, Encoding, Payload};
pub use config::{ConfigError, HubConfig};
pub use correlation::CorrelationId;
pub use error::{HubError, HubResult, TransportError};
pub use matcher::Matcher;
pub use pending::{
    cleanup_task, DispatchOutcome, PendingReply, PendingRequestRegistry, PendingStats,
    StatsSnapshot,
};
