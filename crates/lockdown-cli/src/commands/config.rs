//! Config command - configuration management

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use lockdown_core::Config;
use std::path::{Path, PathBuf};
use tracing::info;

const CONFIG_FILE_NAMES: [&str; 2] = ["lockdown.toml", "config.toml"];

/// Config command arguments
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Generate a configuration file with default values
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "lockdown.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Config file to validate
        file: PathBuf,
    },

    /// Show config file locations
    Paths,
}

/// Execute config command
pub fn execute(args: ConfigArgs, explicit: Option<&Path>) -> Result<()> {
    match args.action {
        ConfigAction::Show => show_config(explicit),
        ConfigAction::Generate { output, force } => generate_config(output, force),
        ConfigAction::Validate { file } => validate_config(file),
        ConfigAction::Paths => show_paths(),
    }
}

fn show_config(explicit: Option<&Path>) -> Result<()> {
    let config = super::load_config(explicit)?;
    println!("{}", config.to_toml().context("Failed to serialize config")?);
    Ok(())
}

fn generate_config(output: PathBuf, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            output.display()
        );
    }

    let toml_str = Config::default()
        .to_toml()
        .context("Failed to serialize config")?;

    let content = format!(
        "# Lockdown configuration\n\
         # Rules and metrics live in the settings store named under [store]\n\n\
         {toml_str}"
    );

    std::fs::write(&output, content)
        .with_context(|| format!("Failed to write config to {}", output.display()))?;

    info!(path = %output.display(), "Generated config file");
    println!("Configuration file generated: {}", output.display());
    Ok(())
}

fn validate_config(file: PathBuf) -> Result<()> {
    let config = Config::load(&file)
        .with_context(|| format!("Failed to load config from {}", file.display()))?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{} Configuration is valid", "✓".green());
    println!("  Store: {}", config.store.path);
    println!(
        "  Proxy: {}:{}",
        config.tunnel.proxy_address, config.tunnel.proxy_port
    );
    println!(
        "  Day log: {} max, {} kept",
        config.metrics.max_log_size, config.metrics.log_reduction
    );
    Ok(())
}

fn show_paths() -> Result<()> {
    println!("Configuration file search paths:");
    println!();

    let mut index = 1;
    for name in CONFIG_FILE_NAMES {
        println!("  {index}. ./{name}");
        index += 1;
    }

    if let Some(dirs) = directories::ProjectDirs::from("", "", "lockdown") {
        println!("  {index}. {}", dirs.config_dir().join("config.toml").display());
    }

    Ok(())
}

/// Find the first existing config file in the search paths
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILE_NAMES {
        let path = PathBuf::from(name);
        if path.exists() {
            return Some(path);
        }
    }

    let dirs = directories::ProjectDirs::from("", "", "lockdown")?;
    let path = dirs.config_dir().join("config.toml");
    path.exists().then_some(path)
}
