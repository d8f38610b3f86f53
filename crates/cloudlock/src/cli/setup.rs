//! Logging initialization

use std::io::IsTerminal;

use anyhow::Result;
use tracing::Level;

/// Initialize tracing subscriber for logging
///
/// Configures the tracing subscriber with:
/// - Environment filter (`RUST_LOG`), defaulting to INFO, or DEBUG when verbose
/// - Stderr output, keeping stdout for command results
/// - Colors only when stderr is a terminal
///
/// # Errors
/// Returns an error if the subscriber initialization fails
pub fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {e}"))
}
