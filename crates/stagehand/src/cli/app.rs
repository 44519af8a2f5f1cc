use clap::{Parser, Subcommand};

use super::unpack::UnpackArg;

#[derive(Clone, Debug, Parser)]
#[command(name = "stagehand", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    #[command(subcommand)]
    pub cmd: Commands,

    /// Log every entry as it is written
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Unpack a tar or tar.gz archive into a directory
    #[command(alias = "x", name = "unpack")]
    Unpack(UnpackArg),
}
