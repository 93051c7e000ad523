//! Error types for the Harmony client.
//!
//! A `NoMatch` is deliberately absent: a stanza that answers nothing is
//! dropped, not reported.

use crate::domain::codec::Encoding;
use crate::domain::config::ConfigError;
use thiserror::Error;

/// Transport-level failures surfaced by the stanza ports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("transport channel closed")]
    ChannelClosed,
    #[error("send failed: {0}")]
    SendFailed(String),
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
}

/// Errors returned by client operations and carried by rejected replies.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HubError {
    /// The payload did not conform to the declared encoding.
    #[error("failed to decode {encoding} payload: {reason}")]
    Decode { encoding: Encoding, reason: String },

    /// The transport refused the outbound stanza.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The request outlived its configured timeout.
    #[error("request `{command}` timed out after {elapsed_ms}ms")]
    Timeout { command: String, elapsed_ms: u64 },

    /// The client was closed before a reply arrived.
    #[error("client closed before a reply arrived")]
    Closed,

    /// A decoded reply lacked a field the operation needs.
    #[error("reply is missing field `{0}`")]
    MissingField(&'static str),

    /// A caller-supplied match predicate failed.
    #[error("match predicate failed: {0}")]
    Predicate(String),

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl HubError {
    /// Shorthand for a decode failure.
    pub fn decode(encoding: Encoding, reason: impl Into<String>) -> Self {
        Self::Decode {
            encoding,
            reason: reason.into(),
        }
    }
}

/// Result type for client operations
pub type HubResult<T> = Result<T, HubError>;
