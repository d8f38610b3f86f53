use std::time::Duration;

use anyhow::Result;
use clap::ArgMatches;
use cloudlock_core::{cancel_pair, AcquireMode, CancelToken, Config, WaitPolicy};

use super::{config_from_args, lock_name};
use crate::{
    commands::{self, lock::LockOptions},
    shutdown,
};

pub async fn handle_lock(matches: &ArgMatches) -> Result<()> {
    let name = lock_name(matches)?;
    let mut config = config_from_args(matches)?;
    apply_wait_flags(&mut config, matches);
    config.validate()?;

    let mode = if matches.get_flag("no-wait") {
        AcquireMode::NonBlocking
    } else {
        AcquireMode::Wait(WaitPolicy::from(&config.wait))
    };
    let options = LockOptions {
        name,
        payload: matches
            .get_one::<String>("payload")
            .map(|text| text.as_bytes().to_vec())
            .unwrap_or_default(),
        mode,
    };

    let (handle, cancel) = cancel_pair();
    shutdown::forward_signals(handle)?;
    let client = commands::connect(&config, cancel).await?;
    commands::lock::run(&client, &options).await
}

pub async fn handle_unlock(matches: &ArgMatches) -> Result<()> {
    let name = lock_name(matches)?;
    let config = config_from_args(matches)?;
    let client = commands::connect(&config, CancelToken::never()).await?;
    commands::unlock::run(&client, &name, &mut std::io::stdout()).await
}

/// `--timeout` and `--interval` override the `[wait]` config section
fn apply_wait_flags(config: &mut Config, matches: &ArgMatches) {
    if let Some(&secs) = matches.get_one::<u64>("timeout") {
        config.wait.timeout_secs = Some(secs);
    }
    if let Some(&secs) = matches.get_one::<u64>("interval") {
        config.wait.poll_interval_secs = secs;
    }
    tracing::debug!(
        poll_interval = ?Duration::from_secs(config.wait.poll_interval_secs),
        timeout = ?config.wait.timeout_secs.map(Duration::from_secs),
        "Wait settings"
    );
}
