use anyhow::Result;

use crate::commands::version::{self, BuildInfo};

pub fn handle() -> Result<()> {
    version::run(&BuildInfo::current(), &mut std::io::stdout())
}
