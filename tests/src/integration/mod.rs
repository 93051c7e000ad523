//! Integration tests across the client, bus and telemetry crates.

pub mod fixtures;
mod flows;
mod notifications;
