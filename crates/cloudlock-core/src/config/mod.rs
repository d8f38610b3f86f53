//! Configuration loading and management
//!
//! # Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Global config: ~/.config/cloudlock/config.toml
//! 3. Explicit config file (`--config <path>`)
//! 4. Environment variables: `GCP_*`, `CLOUDLOCK_*`
//! 5. CLI flags (command-specific)
//!
//! # Example Config
//!
//! ```toml
//! bucket = "ci-locks"
//! project_id = "my-project"
//! region = "europe-west1"
//!
//! [storage]
//! request_timeout_secs = 10
//!
//! [wait]
//! poll_interval_secs = 2
//! timeout_secs = 600
//! ```
//!
//! # Module Structure
//!
//! - `types`: Configuration structure definitions
//! - `defaults`: Default value implementations
//! - `load`: Loading from files and environment
//! - `merge`: Configuration merging logic
//! - `validate`: Range and format checks

mod defaults;
mod load;
mod merge;
mod types;
mod validate;

#[cfg(test)]
mod tests_loading;
#[cfg(test)]
mod tests_validation;

pub use defaults::{DEFAULT_BUCKET, DEFAULT_ENDPOINT, MAX_WAIT_TIMEOUT_SECS};
pub use load::{global_config_path, load_config, load_toml_file};
pub use types::{Config, StorageConfig, WaitConfig};
