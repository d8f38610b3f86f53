use anyhow::Result;
use clap::ArgMatches;
use cloudlock_core::CancelToken;

use super::{config_from_args, lock_name};
use crate::commands;

pub async fn handle(matches: &ArgMatches) -> Result<()> {
    let name = lock_name(matches)?;
    let config = config_from_args(matches)?;
    let client = commands::connect(&config, CancelToken::never()).await?;
    commands::status::run(&client, &name, &mut std::io::stdout()).await
}
