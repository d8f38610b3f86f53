//! Lock command implementation

use anyhow::Result;
use cloudlock_core::{AcquireMode, AcquireOutcome, LockClient, LockName};

use crate::Error;

/// Lock command options
#[derive(Debug, Clone)]
pub struct LockOptions {
    /// Lock to acquire
    pub name: LockName,
    /// Bytes stored in the lock object
    pub payload: Vec<u8>,
    /// Whether to wait for the current holder
    pub mode: AcquireMode,
}

/// Run the lock command
///
/// # Errors
///
/// Returns an error if:
/// - The backend fails
/// - The lock is held and the mode does not wait (exit code 2)
/// - The wait times out (exit code 3) or is cancelled (exit code 130)
pub async fn run(client: &LockClient, options: &LockOptions) -> Result<()> {
    let name = options.name.to_string();
    match client
        .acquire(&options.name, &options.payload, options.mode)
        .await?
    {
        AcquireOutcome::Acquired => Ok(()),
        AcquireOutcome::Contended => Err(Error::LockHeld { name }.into()),
        AcquireOutcome::TimedOut { waited } => Err(Error::WaitTimedOut {
            name,
            waited_secs: waited.as_secs(),
        }
        .into()),
        AcquireOutcome::Cancelled => Err(Error::Cancelled { name }.into()),
    }
}
