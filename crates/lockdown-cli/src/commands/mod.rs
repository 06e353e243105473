//! CLI commands

pub mod check;
pub mod completions;
pub mod config;
pub mod metrics;
pub mod pac;
pub mod replay;
pub mod rules;
pub mod tunnel;

use anyhow::{Context, Result};
use clap::Subcommand;
use lockdown_core::{Config, FileStore, InterceptionPolicy, MetricsLog, SettingsRuleStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(flatten)]
    Store(StoreCommand),

    /// Configuration management
    Config(config::ConfigArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Commands that work on the settings store
#[derive(Subcommand, Debug)]
pub enum StoreCommand {
    /// Check which hosts would be blocked
    Check(check::CheckArgs),

    /// Run a host list through the interception policy
    Replay(replay::ReplayArgs),

    /// Inspect and edit rules
    Rules(rules::RulesArgs),

    /// Show or manage block metrics
    Metrics(metrics::MetricsArgs),

    /// Print the proxy auto-configuration script
    Pac,

    /// Print the tunnel network settings as JSON
    Tunnel,
}

impl StoreCommand {
    /// Open the session and run the command against it
    pub fn execute(self, config: Config, store: Option<&Path>) -> Result<()> {
        let session = Session::open(config, store)?;

        match self {
            Self::Check(args) => check::execute(&session, args),
            Self::Replay(args) => replay::execute(&session, args),
            Self::Rules(args) => rules::execute(&session, args),
            Self::Metrics(args) => metrics::execute(&session, args),
            Self::Pac => pac::execute(&session),
            Self::Tunnel => tunnel::execute(&session),
        }
    }
}

/// Resolved configuration and the settings store it points at
pub struct Session {
    pub config: Config,
    pub store: Arc<FileStore>,
}

impl Session {
    /// Open the settings store, preferring `store_override` over the config
    pub fn open(config: Config, store_override: Option<&Path>) -> Result<Self> {
        let path = store_override
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&config.store.path));
        debug!(path = %path.display(), "Opening settings store");

        let store = FileStore::open(&path)
            .with_context(|| format!("Failed to open settings store {}", path.display()))?;

        Ok(Self {
            config,
            store: Arc::new(store),
        })
    }

    /// Rule store over the session's settings
    pub fn rules(&self) -> SettingsRuleStore {
        SettingsRuleStore::new(self.store.clone())
    }

    /// Metrics log over the session's settings
    pub fn metrics(&self) -> MetricsLog {
        MetricsLog::with_limits(self.store.clone(), self.config.metrics)
    }

    /// Interception policy over the session's settings
    pub fn policy(&self) -> InterceptionPolicy {
        InterceptionPolicy::new(Arc::new(self.rules()), Arc::new(self.metrics()))
    }
}

/// Load the configuration from `explicit`, a well-known location, or defaults
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let config = match explicit {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => match config::find_config_file() {
            Some(path) => Config::load(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => Config::default(),
        },
    };

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}
