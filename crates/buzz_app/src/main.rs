mod cli;
mod platform;

use clap::Parser;

use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    platform::logging::initialize(cli.verbose, cli.log_file.as_deref());
    platform::session::run(cli).await
}
