//! Lock client and acquisition protocol
//!
//! [`LockClient`] binds a storage backend (and through it, one bucket) and
//! exposes the three lock operations. It keeps no record of which locks it
//! holds: ownership lives entirely in the bucket, so any process pointed at
//! the same bucket can release a lock another process acquired.

use std::{fmt, sync::Arc, time::Duration};

use tracing::{debug, info, instrument, warn};

use crate::{
    backend::{CreateResult, DeleteResult, StorageBackend},
    wait::{wait_for_release, CancelToken, WaitPolicy, WaitResult},
    LockName, ObjectMeta, Result,
};

// ═══════════════════════════════════════════════════════════════════════════
// MODES AND OUTCOMES
// ═══════════════════════════════════════════════════════════════════════════

/// Whether an acquire may wait for the current holder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireMode {
    /// Give up at once if the lock is held
    NonBlocking,
    /// Poll until the lock is released, within the policy bounds
    Wait(WaitPolicy),
}

/// How an acquire ended
///
/// Only [`AcquireOutcome::Acquired`] means the caller now holds the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    Acquired,
    /// The lock is held by someone else
    Contended,
    /// The wait deadline passed with the lock still held
    TimedOut { waited: Duration },
    /// Cancellation was requested while waiting
    Cancelled,
}

impl AcquireOutcome {
    pub const fn is_acquired(&self) -> bool {
        matches!(self, Self::Acquired)
    }

    /// Returns the process exit code for this outcome.
    ///
    /// - 0: acquired
    /// - 2: contended
    /// - 3: timed out
    /// - 130: cancelled
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Acquired => 0,
            Self::Contended => 2,
            Self::TimedOut { .. } => 3,
            Self::Cancelled => 130,
        }
    }
}

/// How a release ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The lock object was deleted; carries the payload it held
    Released { payload: Vec<u8> },
    /// There was no lock to release
    NotHeld,
    /// The object disappeared between reading and deleting it
    Vanished,
    /// The object was replaced between reading and deleting it, and was left alone
    Superseded,
}

impl ReleaseOutcome {
    /// Payload of the released lock; empty unless [`ReleaseOutcome::Released`]
    pub fn payload(&self) -> &[u8] {
        match self {
            Self::Released { payload } => payload,
            Self::NotHeld | Self::Vanished | Self::Superseded => &[],
        }
    }

    /// Returns the process exit code for this outcome.
    ///
    /// Everything that leaves the lock free is success (0). A superseded
    /// release leaves someone else's lock in place (5).
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Released { .. } | Self::NotHeld | Self::Vanished => 0,
            Self::Superseded => 5,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// CLIENT
// ═══════════════════════════════════════════════════════════════════════════

/// Handle for acquiring and releasing named locks in one bucket
#[derive(Clone)]
pub struct LockClient {
    backend: Arc<dyn StorageBackend>,
    cancel: CancelToken,
}

impl fmt::Debug for LockClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockClient")
            .field("bucket", &self.backend.bucket())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl LockClient {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            cancel: CancelToken::never(),
        }
    }

    /// Interrupt blocking acquires when `cancel` fires
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn bucket(&self) -> &str {
        self.backend.bucket()
    }

    /// Acquire `name`, storing `payload` in the lock object
    ///
    /// The create is attempted directly; its precondition is the only
    /// existence check. In [`AcquireMode::Wait`] a held lock is polled until
    /// released and the create is retried exactly once. Losing that second
    /// race yields [`AcquireOutcome::Contended`].
    ///
    /// # Errors
    ///
    /// Returns `Backend` if a create fails for any reason other than the
    /// lock already existing. Failed polls while waiting are not errors.
    #[instrument(skip(self, payload, mode), fields(bucket = %self.bucket(), lock = %name))]
    pub async fn acquire(
        &self,
        name: &LockName,
        payload: &[u8],
        mode: AcquireMode,
    ) -> Result<AcquireOutcome> {
        if self.create(name, payload).await? {
            return Ok(AcquireOutcome::Acquired);
        }

        let policy = match mode {
            AcquireMode::NonBlocking => {
                info!("Lock already held");
                return Ok(AcquireOutcome::Contended);
            }
            AcquireMode::Wait(policy) => policy,
        };

        info!(
            poll_interval_secs = policy.poll_interval.as_secs(),
            max_wait_secs = policy.max_wait.map(|d| d.as_secs()),
            "Lock already held - waiting"
        );
        let mut cancel = self.cancel.clone();
        match wait_for_release(self.backend.as_ref(), name, &policy, &mut cancel).await {
            WaitResult::Released => {
                if self.create(name, payload).await? {
                    Ok(AcquireOutcome::Acquired)
                } else {
                    warn!("Lock was taken by another client right after its release");
                    Ok(AcquireOutcome::Contended)
                }
            }
            WaitResult::TimedOut { waited } => {
                info!(waited_secs = waited.as_secs(), "Gave up waiting for lock");
                Ok(AcquireOutcome::TimedOut { waited })
            }
            WaitResult::Cancelled => Ok(AcquireOutcome::Cancelled),
        }
    }

    /// Acquire `name` only if it is free right now
    ///
    /// # Errors
    ///
    /// Same as [`LockClient::acquire`].
    pub async fn try_acquire(&self, name: &LockName, payload: &[u8]) -> Result<AcquireOutcome> {
        self.acquire(name, payload, AcquireMode::NonBlocking).await
    }

    /// Release `name`, returning the payload it held
    ///
    /// Reads the payload and version together, then deletes only if the
    /// version is unchanged. Releasing a lock that is not held is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `Backend` if the read or the delete fails.
    #[instrument(skip(self), fields(bucket = %self.bucket(), lock = %name))]
    pub async fn release(&self, name: &LockName) -> Result<ReleaseOutcome> {
        let Some(stored) = self.backend.read(name).await? else {
            info!("Lock not found - nothing to unlock");
            return Ok(ReleaseOutcome::NotHeld);
        };

        match self.backend.delete_if_version(name, &stored.version).await? {
            DeleteResult::Deleted => {
                info!(
                    payload = %String::from_utf8_lossy(&stored.payload),
                    "Lock is released."
                );
                Ok(ReleaseOutcome::Released {
                    payload: stored.payload,
                })
            }
            DeleteResult::NotFound => {
                warn!("Lock disappeared before it could be deleted");
                Ok(ReleaseOutcome::Vanished)
            }
            DeleteResult::VersionMismatch => {
                warn!(
                    version = %stored.version,
                    "Lock changed hands before it could be deleted - leaving it in place"
                );
                Ok(ReleaseOutcome::Superseded)
            }
        }
    }

    /// Whether `name` is currently held. Never modifies the bucket.
    ///
    /// # Errors
    ///
    /// Returns `Backend` if the lookup fails.
    pub async fn is_held(&self, name: &LockName) -> Result<bool> {
        Ok(self.holder(name).await?.is_some())
    }

    /// Attributes of the lock object for `name`, if held
    ///
    /// # Errors
    ///
    /// Returns `Backend` if the lookup fails.
    pub async fn holder(&self, name: &LockName) -> Result<Option<ObjectMeta>> {
        self.backend.stat(name).await
    }

    async fn create(&self, name: &LockName, payload: &[u8]) -> Result<bool> {
        match self.backend.create_if_absent(name, payload).await? {
            CreateResult::Created { version } => {
                debug!(%version, "Created lock object");
                info!("Lock acquired.");
                Ok(true)
            }
            CreateResult::AlreadyExists => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::time::Instant;

    use super::*;
    use crate::{
        cancel_pair, testing::MockGcsServer, Error, GcsBackend, MemoryBackend, StoredObject,
        VersionStamp,
    };

    fn name(s: &str) -> LockName {
        LockName::new(s).unwrap()
    }

    fn memory_client() -> (Arc<MemoryBackend>, LockClient) {
        let backend = Arc::new(MemoryBackend::default());
        let client = LockClient::new(backend.clone());
        (backend, client)
    }

    /// What the scripted backend does to the object between read and delete
    #[derive(Clone, Copy)]
    enum Race {
        Clean,
        Vanish,
        Replace,
    }

    /// Memory backend with hooks for interleavings a single client cannot produce
    struct ScriptedBackend {
        inner: MemoryBackend,
        race: Race,
        reads_see_absent: bool,
        fail_creates: bool,
    }

    impl ScriptedBackend {
        fn new() -> Self {
            Self {
                inner: MemoryBackend::default(),
                race: Race::Clean,
                reads_see_absent: false,
                fail_creates: false,
            }
        }
    }

    #[async_trait]
    impl StorageBackend for ScriptedBackend {
        fn bucket(&self) -> &str {
            self.inner.bucket()
        }

        async fn create_if_absent(&self, name: &LockName, payload: &[u8]) -> Result<CreateResult> {
            if self.fail_creates {
                return Err(Error::backend("create lock object", "403 Forbidden"));
            }
            self.inner.create_if_absent(name, payload).await
        }

        async fn read(&self, name: &LockName) -> Result<Option<StoredObject>> {
            if self.reads_see_absent {
                return Ok(None);
            }
            self.inner.read(name).await
        }

        async fn stat(&self, name: &LockName) -> Result<Option<ObjectMeta>> {
            self.inner.stat(name).await
        }

        async fn delete_if_version(
            &self,
            name: &LockName,
            version: &VersionStamp,
        ) -> Result<DeleteResult> {
            match self.race {
                Race::Clean => {}
                Race::Vanish => {
                    self.inner.remove(name)?;
                }
                Race::Replace => {
                    self.inner.put(name, b"new holder")?;
                }
            }
            self.inner.delete_if_version(name, version).await
        }
    }

    #[tokio::test]
    async fn test_acquire_release_round_trip() -> Result<()> {
        let (backend, client) = memory_client();
        let lock = name("job-a");

        let outcome = client.try_acquire(&lock, b"host-1 pid 42").await?;
        assert_eq!(outcome, AcquireOutcome::Acquired);
        assert!(backend.contains(&lock)?);

        let released = client.release(&lock).await?;
        assert_eq!(released.payload(), b"host-1 pid 42");
        assert_eq!(released.exit_code(), 0);
        assert!(backend.is_empty()?);
        Ok(())
    }

    #[tokio::test]
    async fn test_job_a_scenario() -> Result<()> {
        let (_backend, client) = memory_client();
        let lock = name("job-a");

        let first = client.try_acquire(&lock, b"").await?;
        assert_eq!(first, AcquireOutcome::Acquired);
        assert_eq!(first.exit_code(), 0);

        let second = client.try_acquire(&lock, b"").await?;
        assert_eq!(second, AcquireOutcome::Contended);
        assert_eq!(second.exit_code(), 2);

        let released = client.release(&lock).await?;
        assert_eq!(released, ReleaseOutcome::Released { payload: Vec::new() });

        assert!(!client.is_held(&lock).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_contended_acquire_leaves_holder_payload() -> Result<()> {
        let (backend, client) = memory_client();
        let lock = name("job-a");

        client.try_acquire(&lock, b"first").await?;
        client.try_acquire(&lock, b"second").await?;

        let stored = backend.read(&lock).await?.map(|o| o.payload);
        assert_eq!(stored, Some(b"first".to_vec()));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_acquires_have_one_winner() -> Result<()> {
        let (_backend, client) = memory_client();
        let lock = name("job-a");

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let client = client.clone();
                let lock = lock.clone();
                tokio::spawn(async move { client.try_acquire(&lock, format!("{i}").as_bytes()).await })
            })
            .collect();

        let mut acquired = 0;
        let mut contended = 0;
        for task in tasks {
            match task.await.map_err(|e| Error::io_error(e.to_string()))?? {
                AcquireOutcome::Acquired => acquired += 1,
                AcquireOutcome::Contended => contended += 1,
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert_eq!(acquired, 1);
        assert_eq!(contended, 7);
        Ok(())
    }

    #[tokio::test]
    async fn test_release_is_idempotent() -> Result<()> {
        let (backend, client) = memory_client();
        let lock = name("never-taken");

        let outcome = client.release(&lock).await?;
        assert_eq!(outcome, ReleaseOutcome::NotHeld);
        assert!(outcome.payload().is_empty());
        assert_eq!(outcome.exit_code(), 0);

        client.try_acquire(&lock, b"x").await?;
        client.release(&lock).await?;
        assert_eq!(client.release(&lock).await?, ReleaseOutcome::NotHeld);
        assert!(backend.is_empty()?);
        Ok(())
    }

    #[tokio::test]
    async fn test_is_held_has_no_side_effects() -> Result<()> {
        let (backend, client) = memory_client();
        let lock = name("job-a");

        assert!(!client.is_held(&lock).await?);
        assert!(backend.is_empty()?);

        client.try_acquire(&lock, b"payload").await?;
        let before = backend.read(&lock).await?;
        assert!(client.is_held(&lock).await?);
        assert!(client.is_held(&lock).await?);
        assert_eq!(backend.read(&lock).await?, before);

        let holder = client.holder(&lock).await?;
        assert_eq!(holder.map(|meta| meta.size), Some(7));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiter_acquires_after_release() -> Result<()> {
        let (backend, holder) = memory_client();
        let lock = name("job-a");
        holder.try_acquire(&lock, b"A").await?;

        let waiter = {
            let client = holder.clone();
            let lock = lock.clone();
            tokio::spawn(async move {
                client
                    .acquire(&lock, b"B", AcquireMode::Wait(WaitPolicy::default()))
                    .await
            })
        };

        tokio::time::sleep(Duration::from_secs(12)).await;
        assert!(!waiter.is_finished());
        let released = holder.release(&lock).await?;
        assert_eq!(released.payload(), b"A");

        let outcome = waiter.await.map_err(|e| Error::io_error(e.to_string()))??;
        assert_eq!(outcome, AcquireOutcome::Acquired);
        assert_eq!(backend.read(&lock).await?.map(|o| o.payload), Some(b"B".to_vec()));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_max_wait_keeps_waiting() -> Result<()> {
        let (_backend, holder) = memory_client();
        let lock = name("job-a");
        holder.try_acquire(&lock, b"A").await?;

        let waiter = {
            let client = holder.clone();
            let lock = lock.clone();
            let policy =
                WaitPolicy::default().with_max_wait(Some(Duration::from_secs(u64::MAX)));
            tokio::spawn(async move { client.acquire(&lock, b"B", AcquireMode::Wait(policy)).await })
        };

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(!waiter.is_finished());
        holder.release(&lock).await?;

        let outcome = waiter.await.map_err(|e| Error::io_error(e.to_string()))??;
        assert_eq!(outcome, AcquireOutcome::Acquired);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_and_leaves_lock() -> Result<()> {
        let (backend, client) = memory_client();
        let lock = name("job-a");
        client.try_acquire(&lock, b"A").await?;

        let policy = WaitPolicy::default()
            .with_poll_interval(Duration::from_secs(1))
            .with_max_wait(Some(Duration::from_secs(3)));
        let outcome = client.acquire(&lock, b"B", AcquireMode::Wait(policy)).await?;

        assert_eq!(
            outcome,
            AcquireOutcome::TimedOut {
                waited: Duration::from_secs(3)
            }
        );
        assert_eq!(outcome.exit_code(), 3);
        assert_eq!(backend.read(&lock).await?.map(|o| o.payload), Some(b"A".to_vec()));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_waiting() -> Result<()> {
        let (backend, client) = memory_client();
        let lock = name("job-a");
        client.try_acquire(&lock, b"A").await?;

        let (handle, token) = cancel_pair();
        let waiter = client.clone().with_cancel(token);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(7)).await;
            handle.cancel();
        });

        let started = Instant::now();
        let outcome = waiter
            .acquire(&lock, b"B", AcquireMode::Wait(WaitPolicy::default()))
            .await?;
        assert_eq!(outcome, AcquireOutcome::Cancelled);
        assert_eq!(outcome.exit_code(), 130);
        assert_eq!(started.elapsed(), Duration::from_secs(7));
        assert_eq!(backend.len()?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_does_not_affect_free_lock() -> Result<()> {
        let (_backend, client) = memory_client();
        let (handle, token) = cancel_pair();
        handle.cancel();

        let outcome = client
            .with_cancel(token)
            .acquire(&name("job-a"), b"", AcquireMode::Wait(WaitPolicy::default()))
            .await?;
        assert_eq!(outcome, AcquireOutcome::Acquired);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_losing_race_after_release_is_contended() -> Result<()> {
        let backend = ScriptedBackend {
            reads_see_absent: true,
            ..ScriptedBackend::new()
        };
        let lock = name("job-a");
        backend.inner.put(&lock, b"other")?;
        let client = LockClient::new(Arc::new(backend));

        let outcome = client
            .acquire(&lock, b"mine", AcquireMode::Wait(WaitPolicy::default()))
            .await?;
        assert_eq!(outcome, AcquireOutcome::Contended);
        Ok(())
    }

    #[tokio::test]
    async fn test_release_vanished() -> Result<()> {
        let backend = Arc::new(ScriptedBackend {
            race: Race::Vanish,
            ..ScriptedBackend::new()
        });
        let client = LockClient::new(backend.clone());
        let lock = name("job-a");
        client.try_acquire(&lock, b"x").await?;

        let outcome = client.release(&lock).await?;
        assert_eq!(outcome, ReleaseOutcome::Vanished);
        assert_eq!(outcome.exit_code(), 0);
        assert!(outcome.payload().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_release_superseded_leaves_new_holder() -> Result<()> {
        let backend = Arc::new(ScriptedBackend {
            race: Race::Replace,
            ..ScriptedBackend::new()
        });
        let client = LockClient::new(backend.clone());
        let lock = name("job-a");
        client.try_acquire(&lock, b"old holder").await?;

        let outcome = client.release(&lock).await?;
        assert_eq!(outcome, ReleaseOutcome::Superseded);
        assert_eq!(outcome.exit_code(), 5);
        assert_eq!(
            backend.inner.read(&lock).await?.map(|o| o.payload),
            Some(b"new holder".to_vec())
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_backend_errors_propagate() {
        let client = LockClient::new(Arc::new(ScriptedBackend {
            fail_creates: true,
            ..ScriptedBackend::new()
        }));

        let result = client.try_acquire(&name("job-a"), b"").await;
        assert!(matches!(result, Err(ref e) if e.exit_code() == 4));
    }

    #[tokio::test]
    async fn test_round_trip_against_gcs_api() -> Result<()> {
        let server = MockGcsServer::start().await?;
        server.create_bucket("locks");
        let client = LockClient::new(Arc::new(GcsBackend::new(&server.config("locks"))?));
        let lock = name("deploys/prod");

        assert_eq!(client.try_acquire(&lock, b"ci run 7").await?, AcquireOutcome::Acquired);
        assert_eq!(client.try_acquire(&lock, b"ci run 8").await?, AcquireOutcome::Contended);
        assert!(client.is_held(&lock).await?);

        let released = client.release(&lock).await?;
        assert_eq!(released.payload(), b"ci run 7");
        assert!(server.object("locks", "deploys/prod").is_none());
        assert_eq!(client.release(&lock).await?, ReleaseOutcome::NotHeld);
        Ok(())
    }

    #[test]
    fn test_debug_shows_bucket() {
        let client = LockClient::new(Arc::new(MemoryBackend::new("team-locks")));
        assert!(format!("{client:?}").contains("team-locks"));
        assert_eq!(client.bucket(), "team-locks");
    }
}
