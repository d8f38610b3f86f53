//! Configuration merging logic
//!
//! Later layers override earlier ones (defaults → global → explicit → env → CLI).
//! A field left at its built-in default in the overriding layer does not
//! replace a value set by an earlier layer.

use super::{
    defaults::{
        DEFAULT_BUCKET, DEFAULT_ENDPOINT, DEFAULT_POLL_INTERVAL_SECS,
        DEFAULT_REQUEST_TIMEOUT_SECS,
    },
    types::{Config, StorageConfig, WaitConfig},
};

impl Config {
    /// Merge another config into this one (other takes precedence)
    pub fn merge(self, other: Self) -> Self {
        Self {
            bucket: if other.bucket == DEFAULT_BUCKET {
                self.bucket
            } else {
                other.bucket
            },
            project_id: other.project_id.or(self.project_id),
            region: other.region.or(self.region),
            service_account: other.service_account.or(self.service_account),
            storage: self.storage.merge(other.storage),
            wait: self.wait.merge(other.wait),
        }
    }
}

impl StorageConfig {
    fn merge(self, other: Self) -> Self {
        Self {
            endpoint: if other.endpoint == DEFAULT_ENDPOINT {
                self.endpoint
            } else {
                other.endpoint
            },
            access_token: other.access_token.or(self.access_token),
            request_timeout_secs: if other.request_timeout_secs == DEFAULT_REQUEST_TIMEOUT_SECS {
                self.request_timeout_secs
            } else {
                other.request_timeout_secs
            },
        }
    }
}

impl WaitConfig {
    fn merge(self, other: Self) -> Self {
        Self {
            poll_interval_secs: if other.poll_interval_secs == DEFAULT_POLL_INTERVAL_SECS {
                self.poll_interval_secs
            } else {
                other.poll_interval_secs
            },
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
        }
    }
}
