//! Command implementations
//!
//! Each command takes a ready [`LockClient`] and writes its results to the
//! given writer, so it can run against any backend.

pub mod lock;
pub mod status;
pub mod unlock;
pub mod version;

use std::sync::Arc;

use anyhow::Result;
use cloudlock_core::{BucketStatus, CancelToken, Config, GcsBackend, LockClient};
use tracing::{debug, info};

/// Build a GCS-backed client, creating the bucket if it does not exist
///
/// # Errors
///
/// Returns an error if the backend cannot be built, or the bucket is
/// missing and cannot be created
pub async fn connect(config: &Config, cancel: CancelToken) -> Result<LockClient> {
    let backend = GcsBackend::new(config)?;
    info!(bucket = %config.bucket, "Using bucket");
    if let Some(account) = &config.service_account {
        debug!(service_account = %account, "Configured service account");
    }

    let status = backend
        .ensure_bucket(config.project_id.as_deref(), config.region.as_deref())
        .await?;
    if status == BucketStatus::Created {
        info!(bucket = %config.bucket, "Created bucket");
    }

    Ok(LockClient::new(Arc::new(backend)).with_cancel(cancel))
}
