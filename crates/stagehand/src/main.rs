use clap::Parser;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, util::SubscriberInitExt};

mod cli;

use cli::app::{App, Commands};

/// Entry point of the `stagehand` cli.
fn main() -> anyhow::Result<()> {
    let app = App::parse();

    let default_filter = if app.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_filter.into())
        .from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .finish()
        .try_init()?;

    match app.cmd {
        Commands::Unpack(arg) => cli::unpack::execute(arg),
    }
}
