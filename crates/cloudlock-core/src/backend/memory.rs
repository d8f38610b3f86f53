//! In-process storage backend
//!
//! Conditional operations run under one mutex, so they are linearizable
//! for every task and thread sharing the same `MemoryBackend`.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{CreateResult, DeleteResult, StorageBackend};
use crate::{Error, LockName, ObjectMeta, Result, StoredObject, VersionStamp};

#[derive(Debug, Clone)]
struct MemoryObject {
    payload: Vec<u8>,
    generation: u64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MemoryState {
    objects: HashMap<LockName, MemoryObject>,
    next_generation: u64,
}

/// Bucket held in process memory
#[derive(Debug)]
pub struct MemoryBackend {
    bucket: String,
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    /// Create an empty in-memory bucket
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            state: Mutex::new(MemoryState {
                objects: HashMap::new(),
                next_generation: 1,
            }),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| Error::backend("lock memory bucket", e.to_string()))
    }

    /// Whether an object named `name` exists
    pub fn contains(&self, name: &LockName) -> Result<bool> {
        Ok(self.state()?.objects.contains_key(name))
    }

    /// Number of objects in the bucket
    pub fn len(&self) -> Result<usize> {
        Ok(self.state()?.objects.len())
    }

    /// Whether the bucket holds no objects
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.state()?.objects.is_empty())
    }

    /// Unconditionally write `name`, replacing any existing object.
    ///
    /// Bypasses the create-if-absent precondition; meant for seeding
    /// state in tests and for simulating foreign writers.
    pub fn put(&self, name: &LockName, payload: &[u8]) -> Result<VersionStamp> {
        let mut state = self.state()?;
        let generation = state.next_generation;
        state.next_generation += 1;
        state.objects.insert(
            name.clone(),
            MemoryObject {
                payload: payload.to_vec(),
                generation,
                created_at: Utc::now(),
            },
        );
        drop(state);
        Ok(VersionStamp::new(generation.to_string()))
    }

    /// Unconditionally remove `name`, returning whether it existed.
    pub fn remove(&self, name: &LockName) -> Result<bool> {
        Ok(self.state()?.objects.remove(name).is_some())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new("cloudlock")
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn create_if_absent(&self, name: &LockName, payload: &[u8]) -> Result<CreateResult> {
        let mut state = self.state()?;
        if state.objects.contains_key(name) {
            return Ok(CreateResult::AlreadyExists);
        }

        let generation = state.next_generation;
        state.next_generation += 1;
        state.objects.insert(
            name.clone(),
            MemoryObject {
                payload: payload.to_vec(),
                generation,
                created_at: Utc::now(),
            },
        );
        drop(state);

        Ok(CreateResult::Created {
            version: VersionStamp::new(generation.to_string()),
        })
    }

    async fn read(&self, name: &LockName) -> Result<Option<StoredObject>> {
        Ok(self.state()?.objects.get(name).map(|obj| StoredObject {
            payload: obj.payload.clone(),
            version: VersionStamp::new(obj.generation.to_string()),
        }))
    }

    async fn stat(&self, name: &LockName) -> Result<Option<ObjectMeta>> {
        Ok(self.state()?.objects.get(name).map(|obj| ObjectMeta {
            name: name.clone(),
            version: VersionStamp::new(obj.generation.to_string()),
            size: obj.payload.len() as u64,
            created_at: Some(obj.created_at),
        }))
    }

    async fn delete_if_version(
        &self,
        name: &LockName,
        version: &VersionStamp,
    ) -> Result<DeleteResult> {
        let mut state = self.state()?;
        let current = state
            .objects
            .get(name)
            .map(|obj| obj.generation.to_string());

        match current {
            None => Ok(DeleteResult::NotFound),
            Some(generation) if generation == version.as_str() => {
                state.objects.remove(name);
                Ok(DeleteResult::Deleted)
            }
            Some(_) => Ok(DeleteResult::VersionMismatch),
        }
    }
}
