//! cloudlock-core - Named locks over strongly-consistent object storage
//!
//! This crate provides:
//! - The lock protocol (`LockClient`: acquire, release, `is_held`)
//! - The storage backend seam (`StorageBackend`) with in-memory and GCS adapters
//! - Bounded waiting (`WaitPolicy`) and cancellation (`CancelToken`)
//! - Layered configuration (defaults, files, environment)
//!
//! Mutual exclusion is delegated entirely to the backend: a lock is held
//! if and only if its object exists, objects are created only when absent,
//! and deleted only when their version still matches.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod types;
pub mod wait;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backend::{
    BucketStatus, CreateResult, DeleteResult, GcsBackend, MemoryBackend, StorageBackend,
};
pub use client::{AcquireMode, AcquireOutcome, LockClient, ReleaseOutcome};
pub use config::{load_config, Config};
pub use error::{Error, Result};
pub use types::{LockName, ObjectMeta, StoredObject, VersionStamp};
pub use wait::{cancel_pair, CancelHandle, CancelToken, WaitPolicy};
