//! Storage backend seam
//!
//! The lock protocol needs exactly four primitives from a bucket:
//!
//! 1. create an object only if it does not exist,
//! 2. delete an object only if its version still matches,
//! 3. read an object's payload together with its version,
//! 4. look up an object's attributes without its payload.
//!
//! Absence is a normal answer, not an error: reads return `Ok(None)` and the
//! conditional operations report it through their result enums. `Err` is
//! reserved for communication, permission, and unexpected-state failures.
//!
//! Implementations must make (1) and (2) atomic and linearizable. The client
//! adds no ordering of its own.

mod gcs;
mod memory;

use async_trait::async_trait;

pub use gcs::{BucketStatus, GcsBackend};
pub use memory::MemoryBackend;

use crate::{LockName, ObjectMeta, Result, StoredObject, VersionStamp};

/// Result of a create-if-absent write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateResult {
    /// The object did not exist and now does
    Created { version: VersionStamp },
    /// An object with this name already exists; nothing was written
    AlreadyExists,
}

/// Result of a delete-if-version-matches call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteResult {
    /// The object matched the version and was removed
    Deleted,
    /// No object with this name exists
    NotFound,
    /// An object exists but at a different version; nothing was removed
    VersionMismatch,
}

/// Conditional object operations on a single bucket
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the bucket this backend operates on
    fn bucket(&self) -> &str;

    /// Create `name` with `payload`, only if no object with that name exists.
    async fn create_if_absent(&self, name: &LockName, payload: &[u8]) -> Result<CreateResult>;

    /// Read the payload and version of `name`, or `None` if absent.
    async fn read(&self, name: &LockName) -> Result<Option<StoredObject>>;

    /// Look up the attributes of `name`, or `None` if absent.
    async fn stat(&self, name: &LockName) -> Result<Option<ObjectMeta>>;

    /// Delete `name`, only if its current version equals `version`.
    async fn delete_if_version(
        &self,
        name: &LockName,
        version: &VersionStamp,
    ) -> Result<DeleteResult>;
}
