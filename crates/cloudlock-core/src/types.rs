//! Lock data model
//!
//! A lock is nothing more than an object in a bucket. Its name is the
//! [`LockName`], its payload is whatever the holder wrote at acquisition,
//! and its [`VersionStamp`] is assigned by the backend on every write.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Longest object name the storage backends accept, in bytes
pub const MAX_LOCK_NAME_LEN: usize = 1024;

/// Object names the backends refuse outright
const RESERVED_NAMES: &[&str] = &[".", ".."];

/// Prefix the backends refuse for object names
const RESERVED_PREFIX: &str = ".well-known/acme-challenge/";

/// Validated name of a lock within one bucket
///
/// Names are flat keys. A `/` is allowed but carries no hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LockName(String);

impl LockName {
    /// Validate and wrap a lock name
    ///
    /// # Errors
    ///
    /// Returns `InvalidLockName` if the name is empty, whitespace-only,
    /// longer than [`MAX_LOCK_NAME_LEN`] bytes, contains control characters,
    /// or is reserved by the storage backend.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_lock_name(&name)?;
        Ok(Self(name))
    }

    /// Get the name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate_lock_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::invalid_lock_name(
            name,
            "cannot be empty or whitespace-only",
        ));
    }

    if name.len() > MAX_LOCK_NAME_LEN {
        return Err(Error::invalid_lock_name(
            name,
            format!("must be at most {MAX_LOCK_NAME_LEN} bytes"),
        ));
    }

    if name.chars().any(char::is_control) {
        return Err(Error::invalid_lock_name(
            name,
            "cannot contain control characters",
        ));
    }

    if RESERVED_NAMES.contains(&name) || name.starts_with(RESERVED_PREFIX) {
        return Err(Error::invalid_lock_name(name, "reserved object name"));
    }

    Ok(())
}

impl fmt::Display for LockName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for LockName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for LockName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for LockName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<LockName> for String {
    fn from(name: LockName) -> Self {
        name.0
    }
}

/// Backend-assigned revision of a lock object
///
/// Opaque to the client: it is only ever compared for equality by the
/// backend when guarding a delete.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionStamp(String);

impl VersionStamp {
    /// Wrap a backend version token
    #[must_use]
    pub fn new(stamp: impl Into<String>) -> Self {
        Self(stamp.into())
    }

    /// Get the stamp as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Attributes of a lock object, without its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Object name
    pub name: LockName,
    /// Current revision
    pub version: VersionStamp,
    /// Payload size in bytes
    pub size: u64,
    /// When the object was written, if the backend reports it
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload and revision of a lock object, read together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Bytes written by the holder at acquisition
    pub payload: Vec<u8>,
    /// Revision the payload belongs to
    pub version: VersionStamp,
}
