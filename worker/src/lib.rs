//! Vigil worker shell.
//!
//! Wires configuration, storage and the audit pipeline together and exposes
//! them as CLI commands. Business logic lives in the `crates/` directory.

pub mod cli;
pub mod commands;
pub mod state;

/// Initialize tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,vigil=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
