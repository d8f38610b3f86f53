//! Common test helpers for CLI integration tests
//!
//! `CliHarness` runs the `cloudlock` binary against an in-process GCS double
//! with an isolated home directory, so neither real credentials nor a user's
//! global config leak into the tests.

#![allow(dead_code)]

use std::process::Output;

use anyhow::{Context, Result};
use assert_cmd::{assert::OutputAssertExt, Command};
use cloudlock_core::testing::MockGcsServer;
use tempfile::TempDir;

pub const BUCKET: &str = "cli-locks";

/// Variables that would otherwise leak in from the developer's shell
const SCRUBBED_ENV: &[&str] = &[
    "GCP_PROJECT_ID",
    "GCP_REGION",
    "GCP_SERVICE_ACCOUNT",
    "CLOUDLOCK_BUCKET",
    "CLOUDLOCK_ACCESS_TOKEN",
    "GOOGLE_OAUTH_ACCESS_TOKEN",
    "CLOUDLOCK_POLL_INTERVAL_SECS",
    "CLOUDLOCK_WAIT_TIMEOUT_SECS",
    "RUST_LOG",
];

pub struct CliHarness {
    pub server: MockGcsServer,
    pub home: TempDir,
}

impl CliHarness {
    /// Start a mock server with [`BUCKET`] already created
    pub async fn start() -> Result<Self> {
        let harness = Self::start_without_bucket().await?;
        harness.server.create_bucket(BUCKET);
        Ok(harness)
    }

    pub async fn start_without_bucket() -> Result<Self> {
        Ok(Self {
            server: MockGcsServer::start().await?,
            home: tempfile::tempdir().context("Failed to create temp home")?,
        })
    }

    /// `cloudlock` pointed at the mock server and [`BUCKET`]
    pub fn command(&self, args: &[&str]) -> Result<Command> {
        Ok(Command::from_std(self.std_command(args)))
    }

    /// Same as [`CliHarness::command`], for tests that manage the child process
    pub fn std_command(&self, args: &[&str]) -> std::process::Command {
        let mut cmd = std::process::Command::new(assert_cmd::cargo::cargo_bin("cloudlock"));
        for key in SCRUBBED_ENV {
            cmd.env_remove(key);
        }
        cmd.env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.home.path().join(".config"))
            .env("CLOUDLOCK_GCS_ENDPOINT", self.server.endpoint())
            .env("CLOUDLOCK_BUCKET", BUCKET)
            .args(args);
        cmd
    }

    /// Run `cloudlock` off the async runtime so the mock keeps serving
    pub async fn run(&self, args: &[&str]) -> Result<Output> {
        self.run_command(self.command(args)?).await
    }

    pub async fn run_command(&self, mut cmd: Command) -> Result<Output> {
        tokio::task::spawn_blocking(move || cmd.output())
            .await
            .context("cloudlock task panicked")?
            .context("Failed to run cloudlock")
    }
}

/// Exit code of a finished run, `None` if killed by a signal
pub fn code(output: &Output) -> Option<i32> {
    output.status.code()
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Assert-style view for predicate checks
pub fn assert(output: Output) -> assert_cmd::assert::Assert {
    output.assert()
}
