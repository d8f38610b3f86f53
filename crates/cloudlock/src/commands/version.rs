//! Version command - build metadata
//!
//! Values are baked in at compile time from `CLOUDLOCK_*` environment
//! variables set by the release pipeline, e.g.
//! `CLOUDLOCK_GIT_COMMIT=$(git rev-parse HEAD) cargo build --release`.

use std::io::Write;

use anyhow::{Context, Result};

const UNKNOWN: &str = "unknown";

/// Build metadata printed by `cloudlock version`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub git_commit: &'static str,
    pub git_branch: &'static str,
    pub git_tag: &'static str,
    pub git_dirty: &'static str,
    pub build_date: &'static str,
    pub build_version: &'static str,
    pub build_hash: &'static str,
}

impl BuildInfo {
    /// Metadata of the running binary
    pub const fn current() -> Self {
        Self {
            git_commit: or_unknown(option_env!("CLOUDLOCK_GIT_COMMIT")),
            git_branch: or_unknown(option_env!("CLOUDLOCK_GIT_BRANCH")),
            git_tag: or_unknown(option_env!("CLOUDLOCK_GIT_TAG")),
            git_dirty: or_unknown(option_env!("CLOUDLOCK_GIT_DIRTY")),
            build_date: or_unknown(option_env!("CLOUDLOCK_BUILD_DATE")),
            build_version: match option_env!("CLOUDLOCK_BUILD_VERSION") {
                Some(version) => version,
                None => env!("CARGO_PKG_VERSION"),
            },
            build_hash: or_unknown(option_env!("CLOUDLOCK_BUILD_HASH")),
        }
    }

    fn fields(&self) -> [(&'static str, &'static str); 7] {
        [
            ("GitCommit", self.git_commit),
            ("GitBranch", self.git_branch),
            ("GitTag", self.git_tag),
            ("GitDirty", self.git_dirty),
            ("BuildDate", self.build_date),
            ("BuildVersion", self.build_version),
            ("BuildHash", self.build_hash),
        ]
    }
}

const fn or_unknown(value: Option<&'static str>) -> &'static str {
    match value {
        Some(value) => value,
        None => UNKNOWN,
    }
}

/// Run the version command
///
/// # Errors
///
/// Returns an error if `out` cannot be written
pub fn run(info: &BuildInfo, out: &mut impl Write) -> Result<()> {
    for (label, value) in info.fields() {
        writeln!(out, "{label}: {value}").context("Failed to write version")?;
    }
    Ok(())
}
