//! # Harmony Hub Test Suite
//!
//! Cross-crate tests that drive [`harmony_client::HarmonyClient`] against a
//! simulated hub over the in-memory stanza stream.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs       # SimulatedHub: scripted hub behind a HubPeer
//!     ├── flows.rs          # Request/reply correlation under concurrency
//!     └── notifications.rs  # State digests and activity events on the bus
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p hc-tests
//! cargo test -p hc-tests integration::flows::
//! ```

pub mod integration;
