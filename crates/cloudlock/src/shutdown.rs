//! Signal handling
//!
//! SIGINT and SIGTERM cancel a blocking acquire instead of killing the
//! process, so the waiter can exit with a distinct code. Operations that are
//! not waiting are unaffected and finish within their request timeout.

use anyhow::{Context, Result};
use cloudlock_core::CancelHandle;

/// Forward SIGINT/SIGTERM to `handle`
///
/// Spawns listener tasks on the current runtime and returns once the
/// handlers are installed.
///
/// # Errors
///
/// Returns an error if a signal handler cannot be registered
pub fn forward_signals(handle: CancelHandle) -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT")?;
        let mut sigterm = signal(SignalKind::terminate()).context("Failed to setup SIGTERM")?;

        tokio::spawn(async move {
            tokio::select! {
                _ = sigint.recv() => tracing::info!("Received SIGINT"),
                _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
            }
            handle.cancel();
        });

        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received Ctrl-C");
                handle.cancel();
            }
        });

        Ok(())
    }
}
