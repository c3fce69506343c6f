use anyhow::Result;
use clap::Parser as _;
use imapcore::{
    cli::{self, Args},
    config::Config,
    logging,
};

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(Some(&args.account));

    let config = Config::load_from_file(args.config.clone())?;
    cli::run(&args, &config)
}
