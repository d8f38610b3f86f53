//! Error types for cloudlock-core
//!
//! Errors are grouped by who can fix them:
//!
//! - **Input errors**: lock names, configuration values, config files (exit code 1)
//! - **Backend errors**: communication, permission, or unexpected state (exit code 4)
//!
//! Contention, timeouts and release races are *not* errors. They are
//! outcomes of the lock protocol (see [`crate::client`]).

use thiserror::Error;

/// Core error type for lock operations
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Lock name failed validation
    #[error("Invalid lock name '{name}': {reason}")]
    InvalidLockName { name: String, reason: String },

    /// Configuration value is missing or out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Config file or other local IO failure
    #[error("IO error: {0}")]
    Io(String),

    /// Malformed config file or backend response
    #[error("Parse error: {0}")]
    Parse(String),

    /// The storage backend failed for a reason other than "absent" or "exists"
    #[error("Backend error during {operation}: {message}")]
    Backend { operation: String, message: String },
}

impl Error {
    /// Create an invalid lock name error.
    pub fn invalid_lock_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLockName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an IO error.
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Create a parse error.
    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a backend error for the named operation.
    pub fn backend(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Whether this error came from the storage backend.
    pub const fn is_backend(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }

    /// Returns the process exit code for this error.
    ///
    /// Exit code scheme:
    /// - 1: Input error (lock name, configuration, config file)
    /// - 4: Backend error
    ///
    /// Codes 2, 3, 5 and 130 belong to protocol outcomes and are never
    /// produced by an `Error`.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidLockName { .. } | Self::InvalidConfig(_) | Self::Io(_) | Self::Parse(_) => {
                1
            }
            Self::Backend { .. } => 4,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::io_error(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::parse_error(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::parse_error(format!("Failed to parse config: {err}"))
    }
}

/// Result type alias for cloudlock-core operations
pub type Result<T> = std::result::Result<T, Error>;
