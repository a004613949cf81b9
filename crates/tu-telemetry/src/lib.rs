//! # TU Telemetry
//!
//! Structured logging for the Thumbs-Up chain client tools.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tu_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     init_telemetry(&TelemetryConfig::for_tool("tu-cli")).expect("Failed to init telemetry");
//!     tracing::info!("ready");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TU_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `TU_JSON_LOGS` | `false` | JSON formatted output |
//! | `TU_CONSOLE_OUTPUT` | `true` | Write events to stderr |

#![warn(missing_docs)]

mod config;

pub use config::TelemetryConfig;

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The level filter did not parse
    #[error("Invalid log filter '{filter}': {message}")]
    Filter {
        /// Filter text.
        filter: String,
        /// Parser message.
        message: String,
    },

    /// A global subscriber is already installed
    #[error("Failed to install subscriber: {0}")]
    SubscriberInit(String),
}

/// Build the level filter for `config`.
pub fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(&config.log_level).map_err(|e| TelemetryError::Filter {
        filter: config.log_level.clone(),
        message: e.to_string(),
    })
}

/// Install the global subscriber.
///
/// Events go to stderr so command output on stdout stays machine readable.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = build_filter(config)?;

    if !config.console_output {
        tracing_subscriber::registry()
            .with(env_filter)
            .try_init()
            .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;
    } else if config.json_logs {
        // JSON output for log shipping
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;
    } else {
        // Pretty output for interactive use
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;
    }

    tracing::debug!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_accepts_directives() {
        let config = TelemetryConfig::default().with_log_level("warn,tu_chain_client=debug");
        assert!(build_filter(&config).is_ok());
    }

    #[test]
    fn test_filter_rejects_garbage() {
        let config = TelemetryConfig::default().with_log_level("tu_chain_client=loudest");
        assert!(matches!(
            build_filter(&config),
            Err(TelemetryError::Filter { .. })
        ));
    }

    #[test]
    fn test_second_init_fails() {
        let config = TelemetryConfig::default().with_log_level("error");
        // Another test binary thread may already own the global subscriber.
        let _ = init_telemetry(&config);
        assert!(matches!(
            init_telemetry(&config),
            Err(TelemetryError::SubscriberInit(_))
        ));
    }
}
