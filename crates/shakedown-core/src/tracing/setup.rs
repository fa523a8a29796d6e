//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the Shakedown tracing/logging system.
///
/// Reads `SHAKEDOWN_LOG` for per-subsystem log levels.
/// Format: `SHAKEDOWN_LOG=shakedown_core=debug,shakedown_forensics=info`
///
/// Falls back to `shakedown=info` if `SHAKEDOWN_LOG` is not set or is invalid.
/// Output goes to stderr so stdout stays free for reports.
///
/// Idempotent: repeated calls are no-ops.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("SHAKEDOWN_LOG")
            .unwrap_or_else(|_| EnvFilter::new("shakedown=info"));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}
