//! # Harmony Telemetry
//!
//! Structured logging for the Harmony hub client.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use harmony_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! let _guard = init_logging(&config).expect("Failed to init logging");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `HARMONY_SERVICE_NAME` | `harmony-hub` | Service name in logs |
//! | `HARMONY_LOG_LEVEL` | `info` | Log level filter (falls back to `RUST_LOG`) |
//! | `HARMONY_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `HARMONY_JSON_LOGS` | `false` | JSON lines instead of pretty output |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{init_logging, LoggingGuard};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Global subscriber already installed: {0}")]
    AlreadyInitialized(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Convenience macro for creating a span around one hub command.
///
/// # Example
///
/// ```rust,ignore
/// let span = harmony_telemetry::command_span!("getCurrentActivity", correlation_id = %id);
/// let _entered = span.enter();
/// ```
#[macro_export]
macro_rules! command_span {
    ($command:expr $(, $($field:tt)*)?) => {
        tracing::info_span!("hub_command", command = $command $(, $($field)*)?)
    };
}
