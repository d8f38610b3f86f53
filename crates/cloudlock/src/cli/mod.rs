//! Command-line definition
//!
//! Built with the clap builder API. Every lock verb takes exactly one
//! positional lock name.

pub mod handlers;
pub mod setup;

use clap::{value_parser, Arg, ArgAction, Command};
use cloudlock_core::config::MAX_WAIT_TIMEOUT_SECS;

pub fn build_cli() -> Command {
    Command::new("cloudlock")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Distributed named locks on Google Cloud Storage")
        .long_about(
            "Distributed named locks on Google Cloud Storage.\n\n\
             Useful for preventing multiple instances of a program from running \
             at the same time, across machines.",
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("bucket")
                .long("bucket")
                .global(true)
                .value_name("NAME")
                .help("Bucket holding the locks [env: CLOUDLOCK_BUCKET]"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("PATH")
                .value_parser(value_parser!(std::path::PathBuf))
                .help("Read configuration from this TOML file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log backend calls (debug level)"),
        )
        .subcommand(cmd_lock())
        .subcommand(cmd_unlock())
        .subcommand(cmd_status())
        .subcommand(cmd_version())
}

fn lock_name_arg() -> Arg {
    Arg::new("name")
        .required(true)
        .value_name("NAME")
        .help("Name of the lock")
}

fn cmd_lock() -> Command {
    Command::new("lock")
        .about("Acquire a lock, waiting for the current holder by default")
        .arg(lock_name_arg())
        .arg(
            Arg::new("no-wait")
                .long("no-wait")
                .action(ArgAction::SetTrue)
                .conflicts_with_all(["timeout", "interval"])
                .help("Fail with exit code 2 if the lock is held"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECS")
                .value_parser(value_parser!(u64).range(0..=MAX_WAIT_TIMEOUT_SECS))
                .help("Give up waiting after this many seconds (exit code 3)"),
        )
        .arg(
            Arg::new("interval")
                .long("interval")
                .value_name("SECS")
                .value_parser(value_parser!(u64).range(1..=3600))
                .help("Seconds between polls while waiting"),
        )
        .arg(
            Arg::new("payload")
                .long("payload")
                .value_name("TEXT")
                .help("Text stored in the lock object, returned on unlock"),
        )
}

fn cmd_unlock() -> Command {
    Command::new("unlock")
        .about("Release a lock and print its payload")
        .arg(lock_name_arg())
}

fn cmd_status() -> Command {
    Command::new("status")
        .about("Show whether a lock is held")
        .arg(lock_name_arg())
}

fn cmd_version() -> Command {
    Command::new("version").about("Print build information")
}
