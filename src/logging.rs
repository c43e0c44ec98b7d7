//! Diagnostic logging via `tracing`.
//!
//! Logs go to stderr so command output on stdout stays pipeable.  The
//! filter comes from `PASSVAULT_LOG` (e.g. `PASSVAULT_LOG=debug`) and
//! defaults to warnings only.  Events carry service names and paths,
//! never secrets or key material.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "PASSVAULT_LOG";

/// Initialize the global tracing subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
