//! Default configuration values

use super::types::{Config, StorageConfig, WaitConfig};

/// Bucket used when none is configured
pub const DEFAULT_BUCKET: &str = "cloudlock";

/// Public GCS JSON API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";

/// Longest accepted wait timeout (one year); leave it unset to wait forever
pub const MAX_WAIT_TIMEOUT_SECS: u64 = 365 * 24 * 60 * 60;

pub(super) const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub(super) const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// ═══════════════════════════════════════════════════════════════════════════
// DEFAULT IMPLEMENTATIONS
// ═══════════════════════════════════════════════════════════════════════════

impl Default for Config {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            project_id: None,
            region: None,
            service_account: None,
            storage: StorageConfig::default(),
            wait: WaitConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            access_token: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            timeout_secs: None,
        }
    }
}
