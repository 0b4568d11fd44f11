mod engine;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::error;

use crate::engine::use_command;

#[derive(Parser, Debug)]
#[command(name = "rusbit-inspect", version, about = "Inspect bencoded data, torrent files and trackers")]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true, default_value = rusbit_inspect::config::DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a bencoded string and print it as JSON
    Decode { value: String },
    /// Show the metadata of a .torrent file
    Info {
        torrent: PathBuf,
        /// Print the metadata as JSON
        #[arg(long)]
        json: bool,
    },
    /// Announce to the first tracker and list the peers it returns
    Peers { torrent: PathBuf },
    /// Ask the first tracker for swarm statistics
    Scrape { torrent: PathBuf },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match use_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
