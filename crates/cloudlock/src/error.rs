//! CLI error types and exit-code mapping
//!
//! Lock outcomes that are not success travel up to `main` as errors so that
//! every command can use `?`. Each carries its own exit code.

use thiserror::Error;

/// Non-success outcomes of a CLI command
#[derive(Debug, Error)]
pub enum Error {
    /// Non-blocking acquire found the lock taken (exit code 2)
    #[error("Lock '{name}' is already held")]
    LockHeld { name: String },

    /// Blocking acquire gave up (exit code 3)
    #[error("Timed out after {waited_secs}s waiting for lock '{name}'")]
    WaitTimedOut { name: String, waited_secs: u64 },

    /// Interrupted by SIGINT/SIGTERM while waiting (exit code 130)
    #[error("Cancelled while waiting for lock '{name}'")]
    Cancelled { name: String },

    /// Lock changed hands between read and delete (exit code 5)
    #[error("Lock '{name}' changed hands before it could be released; left in place")]
    ReleaseSuperseded { name: String },
}

impl Error {
    /// Returns the process exit code for this error.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::LockHeld { .. } => 2,
            Self::WaitTimedOut { .. } => 3,
            Self::ReleaseSuperseded { .. } => 5,
            Self::Cancelled { .. } => 130,
        }
    }
}

/// Exit code for any error reaching `main`
///
/// CLI outcomes and core errors carry their own codes. Anything else is
/// treated as an input error (1).
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<Error>()
        .map(Error::exit_code)
        .or_else(|| {
            err.downcast_ref::<cloudlock_core::Error>()
                .map(cloudlock_core::Error::exit_code)
        })
        .unwrap_or(1)
}
