//! # Shared Types Crate
//!
//! This crate contains the stanza model exchanged between the transport and
//! the Harmony client.
//!
//! ## Design Principles
//!
//! - **Opaque Messages**: A [`Stanza`] is an element tree with read accessors.
//!   Parsing raw XML into stanzas is the transport's job.
//! - **Immutable Inbound**: Received stanzas are never mutated; they are
//!   dispatched and dropped.
//! - **Builder for Outbound**: Outbound stanzas are assembled with
//!   [`StanzaBuilder`].

pub mod encoded;
pub mod stanza;

pub use encoded::EncodedMap;
pub use stanza::{names, Stanza, StanzaBuilder};
