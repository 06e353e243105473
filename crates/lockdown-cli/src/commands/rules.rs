//! Rule management commands
//!
//! Edits the user override maps and installs vendor rule sets, the same
//! settings the host app would write.

use super::Session;
use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use lockdown_core::rules::{RuleSet, RuleStore};
use lockdown_core::settings::{keys, SettingsStore};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::info;

/// Rules command arguments
#[derive(Args, Debug)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub action: RulesAction,
}

/// Rules subcommands
#[derive(Subcommand, Debug)]
pub enum RulesAction {
    /// List merged block and allow patterns
    List {
        /// Only list block patterns
        #[arg(long, conflicts_with = "allow")]
        block: bool,

        /// Only list allow patterns
        #[arg(long)]
        allow: bool,
    },

    /// List vendor rule groups
    Groups,

    /// Add a user override
    Add {
        /// Domain to add
        domain: String,

        /// Add to the allow list instead of the block list
        #[arg(long)]
        allow: bool,

        /// Store the override as disabled
        #[arg(long)]
        disabled: bool,
    },

    /// Remove a user override
    Remove {
        /// Domain to remove
        domain: String,

        /// Remove from the allow list instead of the block list
        #[arg(long)]
        allow: bool,
    },

    /// Install a vendor rule set from a JSON file
    Import {
        /// Rule set file
        file: PathBuf,
    },

    /// Enable or disable a vendor rule group
    Toggle {
        /// Group name
        group: String,

        /// New state
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

/// Execute rules command
pub fn execute(session: &Session, args: RulesArgs) -> Result<()> {
    match args.action {
        RulesAction::List { block, allow } => list(session, block, allow),
        RulesAction::Groups => groups(session),
        RulesAction::Add {
            domain,
            allow,
            disabled,
        } => add(session, &domain, allow, !disabled),
        RulesAction::Remove { domain, allow } => remove(session, &domain, allow),
        RulesAction::Import { file } => import(session, file),
        RulesAction::Toggle { group, enabled } => toggle(session, &group, enabled),
    }
}

fn override_key(allow: bool) -> &'static str {
    if allow {
        keys::USER_WHITELISTED_DOMAINS
    } else {
        keys::USER_LOCKDOWN_DOMAINS
    }
}

fn list(session: &Session, block_only: bool, allow_only: bool) -> Result<()> {
    let rules = session.rules();

    if !allow_only {
        let patterns = rules.merged_block_domains();
        println!("{} ({})", "Block patterns".red().bold(), patterns.len());
        for pattern in &patterns {
            println!("  {pattern}");
        }
    }

    if !block_only {
        let patterns = rules.merged_allow_domains();
        println!("{} ({})", "Allow patterns".green().bold(), patterns.len());
        for pattern in &patterns {
            println!("  {pattern}");
        }
    }

    Ok(())
}

fn groups(session: &Session) -> Result<()> {
    let rule_set = session.rules().vendor_rules();
    if rule_set.groups.is_empty() {
        println!("{}", "No vendor rule groups installed".yellow());
        return Ok(());
    }

    for (name, group) in &rule_set.groups {
        let state = if group.enabled {
            "enabled".green()
        } else {
            "disabled".dimmed()
        };
        println!(
            "{:<24} {:<8} {} domains, {} ranges",
            name,
            state,
            group.domains.len(),
            group.ip_ranges.len()
        );
    }

    Ok(())
}

fn override_map(store: &dyn SettingsStore, key: &str) -> Map<String, Value> {
    match store.get(key) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn add(session: &Session, domain: &str, allow: bool, enabled: bool) -> Result<()> {
    let domain = domain.trim();
    if domain.is_empty() {
        bail!("Domain must not be empty");
    }

    let key = override_key(allow);
    let mut map = override_map(session.store.as_ref(), key);
    map.insert(domain.to_string(), Value::Bool(enabled));
    session
        .store
        .set(key, Value::Object(map))
        .with_context(|| format!("Failed to update {key}"))?;

    info!(domain, key, enabled, "Override added");
    println!("{} {} -> {}", "✓".green(), domain, key);
    Ok(())
}

fn remove(session: &Session, domain: &str, allow: bool) -> Result<()> {
    let domain = domain.trim();
    let key = override_key(allow);
    let mut map = override_map(session.store.as_ref(), key);

    if map.remove(domain).is_none() {
        println!("{} {} not found in {}", "!".yellow(), domain, key);
        return Ok(());
    }

    session
        .store
        .set(key, Value::Object(map))
        .with_context(|| format!("Failed to update {key}"))?;

    info!(domain, key, "Override removed");
    println!("{} {} removed from {}", "✓".green(), domain, key);
    Ok(())
}

fn import(session: &Session, file: PathBuf) -> Result<()> {
    let content = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;

    // Validate before storing so a bad file cannot silently disable blocking
    let rule_set: RuleSet = serde_json::from_value(value.clone())
        .with_context(|| format!("{} is not a rule set", file.display()))?;

    session
        .store
        .set(keys::LOCKDOWN_DEFAULTS, value)
        .context("Failed to store rule set")?;

    let enabled = rule_set.enabled_groups().count();
    info!(groups = rule_set.groups.len(), enabled, "Vendor rule set imported");
    println!(
        "{} Imported {} groups ({} enabled)",
        "✓".green(),
        rule_set.groups.len(),
        enabled
    );
    Ok(())
}

fn toggle(session: &Session, group: &str, enabled: bool) -> Result<()> {
    let mut rule_set = session.rules().vendor_rules();
    let Some(entry) = rule_set.groups.get_mut(group) else {
        bail!("Unknown rule group: {group}");
    };
    entry.enabled = enabled;

    let value = serde_json::to_value(&rule_set).context("Failed to encode rule set")?;
    session
        .store
        .set(keys::LOCKDOWN_DEFAULTS, value)
        .context("Failed to store rule set")?;

    println!("{} {} {}", "✓".green(), group, if enabled { "enabled" } else { "disabled" });
    Ok(())
}
