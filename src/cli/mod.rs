mod nuke;
mod sync;

use std::path::PathBuf;

use clap::Parser;

pub use nuke::nuke;
pub use sync::sync_folders;

use crate::config::Config;

/// Keeps the local folder list of an IMAP account in sync with the server.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Account to work on, as named in the config file.
    #[arg(short, long)]
    pub account: String,
    /// Config file to use instead of the default location.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Remove all local state of the account.
    #[arg(long)]
    pub nuke: bool,
}

pub fn run(args: &Args, config: &Config) -> anyhow::Result<()> {
    if args.nuke {
        nuke(config, &args.account)
    } else {
        sync_folders(config, &args.account)
    }
}
