//! Command-line argument parsing

use crate::commands::Command;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Lockdown - connection-level content blocking
///
/// Inspects and edits the rules the blocking proxy enforces, replays host
/// lists through the interception policy and reports block metrics.
#[derive(Parser, Debug)]
#[command(name = "lockdown")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE", global = true, env = "LOCKDOWN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Settings store path (overrides the config file)
    #[arg(short = 's', long, value_name = "FILE", global = true, env = "LOCKDOWN_STORE")]
    pub store: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format for logs
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Log file path
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<String>,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
    /// Compact format
    Compact,
}
