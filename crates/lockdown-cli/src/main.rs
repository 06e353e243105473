//! Lockdown CLI
//!
//! Command-line front end for the blocking proxy's decision layer.

mod args;
mod commands;
mod logging;

use anyhow::Result;
use clap::Parser;
use tracing::error;

use args::Args;
use commands::Command;

fn main() -> Result<()> {
    let args = Args::parse();

    // Config is needed before logging so its [logging] section applies
    let config = commands::load_config(args.config.as_deref());
    let logging_config = config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    let _guard = logging::init(&args, &logging_config)?;

    let result = match args.command {
        Command::Config(config_args) => {
            commands::config::execute(config_args, args.config.as_deref())
        }
        Command::Completions(comp_args) => commands::completions::execute(comp_args),
        Command::Store(command) => {
            config.and_then(|config| command.execute(config, args.store.as_deref()))
        }
    };

    if let Err(ref e) = result {
        error!("Fatal error: {:#}", e);
    }

    result
}
