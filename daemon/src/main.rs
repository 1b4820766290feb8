//! Entrypoint for the `linkwatch` binary.

use clap::Parser as _;
use linkwatch_daemon::{cli::Cli, inner_main};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    inner_main(Cli::parse()).await
}
