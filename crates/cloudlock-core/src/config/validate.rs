//! Configuration validation

use super::{defaults::MAX_WAIT_TIMEOUT_SECS, types::Config};
use crate::{Error, Result};

/// Accepted range for the poll interval, in seconds
const POLL_INTERVAL_RANGE: std::ops::RangeInclusive<u64> = 1..=3600;

// ═══════════════════════════════════════════════════════════════════════════
// VALIDATION LOGIC
// ═══════════════════════════════════════════════════════════════════════════

impl Config {
    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any values are out of range or invalid
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(Error::invalid_config(
                "bucket cannot be empty - unset it to use the default or provide a name",
            ));
        }

        if !POLL_INTERVAL_RANGE.contains(&self.wait.poll_interval_secs) {
            return Err(Error::invalid_config(format!(
                "wait.poll_interval_secs must be {}-{}",
                POLL_INTERVAL_RANGE.start(),
                POLL_INTERVAL_RANGE.end()
            )));
        }

        if let Some(secs) = self.wait.timeout_secs {
            if secs > MAX_WAIT_TIMEOUT_SECS {
                return Err(Error::invalid_config(format!(
                    "wait.timeout_secs must be at most {MAX_WAIT_TIMEOUT_SECS} (got {secs}) - unset it to wait forever"
                )));
            }
        }

        if self.storage.request_timeout_secs == 0 {
            return Err(Error::invalid_config(
                "storage.request_timeout_secs must be greater than 0",
            ));
        }

        let endpoint = self.storage.endpoint.as_str();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(Error::invalid_config(format!(
                "storage.endpoint must start with http:// or https:// (got '{endpoint}')"
            )));
        }

        Ok(())
    }
}
