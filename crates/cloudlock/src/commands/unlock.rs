//! Unlock command implementation

use std::io::Write;

use anyhow::{Context, Result};
use cloudlock_core::{LockClient, LockName, ReleaseOutcome};

use crate::Error;

/// Run the unlock command, writing the released payload to `out`
///
/// Releasing a lock that is not held, or that vanished mid-release, is
/// success with no output.
///
/// # Errors
///
/// Returns an error if the backend fails, or the lock changed hands
/// before it could be deleted (exit code 5)
pub async fn run(client: &LockClient, name: &LockName, out: &mut impl Write) -> Result<()> {
    match client.release(name).await? {
        ReleaseOutcome::Released { payload } => {
            out.write_all(&payload)
                .and_then(|()| out.flush())
                .context("Failed to write lock payload")?;
            Ok(())
        }
        ReleaseOutcome::NotHeld | ReleaseOutcome::Vanished => Ok(()),
        ReleaseOutcome::Superseded => Err(Error::ReleaseSuperseded {
            name: name.to_string(),
        }
        .into()),
    }
}
