//! cloudlock CLI - Distributed named locks on Google Cloud Storage
//!
//! Binary name: `cloudlock`

use std::process;

#[tokio::main]
async fn main() {
    let code = cloudlock::cli::handlers::run_cli(std::env::args_os()).await;

    #[allow(clippy::exit)]
    process::exit(code);
}
