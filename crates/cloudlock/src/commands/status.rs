//! Status command implementation

use std::io::Write;

use anyhow::{Context, Result};
use cloudlock_core::{LockClient, LockName};

/// Run the status command
///
/// Prints one line: `<name>: held (...)` or `<name>: not held`. Both are
/// success; only backend failures are errors.
///
/// # Errors
///
/// Returns an error if the lookup fails
pub async fn run(client: &LockClient, name: &LockName, out: &mut impl Write) -> Result<()> {
    let line = match client.holder(name).await? {
        Some(meta) => {
            let since = meta
                .created_at
                .map(|at| format!(", since {}", at.to_rfc3339()))
                .unwrap_or_default();
            format!(
                "{name}: held (version {}, {} bytes{since})",
                meta.version, meta.size
            )
        }
        None => format!("{name}: not held"),
    };
    writeln!(out, "{line}").context("Failed to write status")
}
