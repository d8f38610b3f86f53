//! Configuration type definitions
//!
//! Pure data holders. Behavior lives in the sibling modules.

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════
// MAIN CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════

/// Root configuration structure
///
/// Loaded from defaults → global → explicit file → env vars → CLI flags,
/// then passed by value into the backend and client constructors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Bucket holding the lock objects
    pub bucket: String,
    /// Project the bucket is created in when missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Location for a newly created bucket
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Service account identity, reported in logs only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_account: Option<String>,
    pub storage: StorageConfig,
    pub wait: WaitConfig,
}

// ═══════════════════════════════════════════════════════════════════════════
// NESTED CONFIGURATION STRUCTURES
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// Base URL of the GCS JSON API
    pub endpoint: String,
    /// OAuth bearer token; requests are unauthenticated without one
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WaitConfig {
    pub poll_interval_secs: u64,
    /// Upper bound on a blocking acquire; unbounded when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}
