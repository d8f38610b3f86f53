//! Configuration loading from files and environment
//!
//! This module handles loading configuration from:
//! 1. Built-in defaults
//! 2. Global config: ~/.config/cloudlock/config.toml
//! 3. Explicit config file passed by the caller
//! 4. Environment variables
//!
//! All operations return new instances rather than mutating shared state.

use std::path::{Path, PathBuf};

use super::types::Config;
use crate::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════
// PUBLIC API
// ═══════════════════════════════════════════════════════════════════════════

/// Load configuration from all sources with hierarchy
///
/// A missing global config is fine. A missing explicit config is an error,
/// since the caller asked for it by name.
///
/// # Errors
///
/// Returns error if:
/// - A config file is unreadable or malformed TOML
/// - An environment variable holds an unparsable value
/// - The layered values fail validation
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    // 1. Start with built-in defaults
    let config = Config::default();

    // 2. Load global config if exists
    let config = match global_config_path() {
        Some(global_path) if global_path.exists() => {
            let global = load_toml_file(&global_path)?;
            config.merge(global)
        }
        _ => config,
    };

    // 3. Load explicit config
    let config = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::io_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            config.merge(load_toml_file(path)?)
        }
        None => config,
    };

    // 4. Apply environment variable overrides
    let config = config.apply_env_vars()?;

    // 5. Validate
    config.validate()?;
    Ok(config)
}

// ═══════════════════════════════════════════════════════════════════════════
// PATH HELPERS
// ═══════════════════════════════════════════════════════════════════════════

/// Get path to global config file
pub fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "cloudlock")
        .map(|proj_dirs| proj_dirs.config_dir().join("config.toml"))
}

/// Load a TOML file into a partial Config
///
/// # Errors
///
/// Returns error if:
/// - File cannot be read
/// - Path is a directory instead of a file
/// - TOML is malformed
pub fn load_toml_file(path: &Path) -> Result<Config> {
    if path.is_dir() {
        return Err(Error::io_error(format!(
            "Config path is a directory, not a file: {}\n\
             \n\
             The config path should point to a TOML file.",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            Error::io_error(format!(
                "Permission denied reading config file {}: {e}\n\
                 \n\
                 Check file permissions: ls -l {}",
                path.display(),
                path.display()
            ))
        } else {
            Error::io_error(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        }
    })?;

    toml::from_str(&content).map_err(|e| {
        Error::parse_error(format!(
            "Failed to parse config file {}: {e}",
            path.display()
        ))
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// ENVIRONMENT VARIABLE OVERRIDES
// ═══════════════════════════════════════════════════════════════════════════

impl Config {
    /// Apply overrides from the process environment
    ///
    /// # Errors
    ///
    /// Returns error if environment variable values are invalid
    pub fn apply_env_vars(self) -> Result<Self> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    ///
    /// Empty values count as unset, so `CLOUDLOCK_BUCKET=""` keeps the
    /// configured (or default) bucket.
    ///
    /// # Errors
    ///
    /// Returns error if a numeric variable does not parse
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        // GCP_PROJECT_ID, GCP_REGION, GCP_SERVICE_ACCOUNT
        if let Some(value) = var("GCP_PROJECT_ID") {
            self.project_id = Some(value);
        }
        if let Some(value) = var("GCP_REGION") {
            self.region = Some(value);
        }
        if let Some(value) = var("GCP_SERVICE_ACCOUNT") {
            self.service_account = Some(value);
        }

        // CLOUDLOCK_BUCKET
        if let Some(value) = var("CLOUDLOCK_BUCKET") {
            self.bucket = value;
        }

        // CLOUDLOCK_GCS_ENDPOINT
        if let Some(value) = var("CLOUDLOCK_GCS_ENDPOINT") {
            self.storage.endpoint = value;
        }

        // CLOUDLOCK_ACCESS_TOKEN, then GOOGLE_OAUTH_ACCESS_TOKEN
        let token = var("CLOUDLOCK_ACCESS_TOKEN").or_else(|| var("GOOGLE_OAUTH_ACCESS_TOKEN"));
        if token.is_some() {
            self.storage.access_token = token;
        }

        // CLOUDLOCK_POLL_INTERVAL_SECS
        if let Some(value) = var("CLOUDLOCK_POLL_INTERVAL_SECS") {
            self.wait.poll_interval_secs = parse_secs("CLOUDLOCK_POLL_INTERVAL_SECS", &value)?;
        }

        // CLOUDLOCK_WAIT_TIMEOUT_SECS
        if let Some(value) = var("CLOUDLOCK_WAIT_TIMEOUT_SECS") {
            self.wait.timeout_secs = Some(parse_secs("CLOUDLOCK_WAIT_TIMEOUT_SECS", &value)?);
        }

        Ok(self)
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    value.trim().parse().map_err(|e| {
        Error::invalid_config(format!(
            "Invalid {key} value '{value}': {e} (expected whole seconds)"
        ))
    })
}
