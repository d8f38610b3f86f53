//! Command dispatch
//!
//! Handlers turn parsed arguments into command options, build the
//! configuration and client, and hand over to `crate::commands`.

mod lock;
mod status;
mod version;

use std::{ffi::OsString, path::PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;
use cloudlock_core::{load_config, Config, LockName};

use super::{build_cli, setup};
use crate::exit_code;

/// Parse `args`, run the selected command, and return the process exit code
///
/// Usage errors exit with 1 rather than clap's 2, which is reserved for a
/// held lock. `--help` and `--version` exit with 0.
pub async fn run_cli<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = match build_cli().try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(err) => {
            let _ = err.print();
            return i32::from(err.use_stderr());
        }
    };

    match dispatch(&matches).await {
        Ok(()) => 0,
        Err(err) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Error: {err:#}");
            }
            exit_code(&err)
        }
    }
}

/// Route to the handler for the selected subcommand
///
/// # Errors
///
/// Returns the command's error or non-success outcome
pub async fn dispatch(matches: &ArgMatches) -> Result<()> {
    let Some((command, sub)) = matches.subcommand() else {
        anyhow::bail!("Unknown command. Run 'cloudlock --help' for usage.");
    };

    if let Err(e) = setup::init_tracing(sub.get_flag("verbose")) {
        tracing::debug!("{e}");
    }

    match command {
        "lock" => lock::handle_lock(sub).await,
        "unlock" => lock::handle_unlock(sub).await,
        "status" => status::handle(sub).await,
        "version" => version::handle(),
        _ => anyhow::bail!("Unknown command '{command}'. Run 'cloudlock --help' for usage."),
    }
}

/// Validated lock name from the positional argument
fn lock_name(matches: &ArgMatches) -> Result<LockName> {
    let name = matches
        .get_one::<String>("name")
        .context("A lock name is required")?;
    Ok(LockName::new(name.as_str())?)
}

/// Layered configuration with the global CLI flags applied on top
fn config_from_args(matches: &ArgMatches) -> Result<Config> {
    let explicit = matches.get_one::<PathBuf>("config");
    let config = load_config(explicit.map(PathBuf::as_path))?;
    apply_global_flags(config, matches)
}

/// Apply `--bucket` over `config` and re-validate
fn apply_global_flags(mut config: Config, matches: &ArgMatches) -> Result<Config> {
    if let Some(bucket) = matches.get_one::<String>("bucket") {
        config.bucket.clone_from(bucket);
    }

    config.validate()?;
    Ok(config)
}
