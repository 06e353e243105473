//! Metrics command - block counters and day log

use super::Session;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use lockdown_core::settings::{keys, SettingsStore};
use serde_json::Value;

/// Metrics command arguments
#[derive(Args, Debug)]
pub struct MetricsArgs {
    #[command(subcommand)]
    pub action: MetricsAction,
}

/// Metrics subcommands
#[derive(Subcommand, Debug)]
pub enum MetricsAction {
    /// Show counters and the most recent day log lines
    Show {
        /// Number of day log lines to show
        #[arg(short = 'n', long, default_value = "10")]
        lines: usize,

        /// Print the raw state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Clear all counters and the day log
    Reset,

    /// Turn metrics recording on
    Enable,

    /// Turn metrics recording off
    Disable,
}

/// Execute metrics command
pub fn execute(session: &Session, args: MetricsArgs) -> Result<()> {
    match args.action {
        MetricsAction::Show { lines, json } => show(session, lines, json),
        MetricsAction::Reset => {
            session.metrics().reset().context("Failed to reset metrics")?;
            println!("{} Metrics reset", "✓".green());
            Ok(())
        }
        MetricsAction::Enable => set_enabled(session, true),
        MetricsAction::Disable => set_enabled(session, false),
    }
}

fn show(session: &Session, lines: usize, json: bool) -> Result<()> {
    let metrics = session.metrics();
    let state = metrics.snapshot();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&state).context("Failed to serialize metrics")?
        );
        return Ok(());
    }

    let status = if metrics.is_enabled() {
        "enabled".green()
    } else {
        "disabled".yellow()
    };

    println!("{}", "═".repeat(40).bright_blue());
    println!("{} ({})", " Block metrics".bright_white().bold(), status);
    println!("{}", "═".repeat(40).bright_blue());
    println!("Total:     {}", state.total);
    println!("Today:     {} (day {})", state.day_count, state.active_day);
    println!("This week: {} (week {})", state.week_count, state.active_week);

    if !state.day_log.is_empty() && lines > 0 {
        println!();
        let skip = state.day_log.len().saturating_sub(lines);
        for line in &state.day_log[skip..] {
            println!("  {line}");
        }
    }

    Ok(())
}

fn set_enabled(session: &Session, enabled: bool) -> Result<()> {
    session
        .store
        .set(keys::METRICS_ENABLED, Value::Bool(enabled))
        .context("Failed to update metrics flag")?;

    println!(
        "{} Metrics {}",
        "✓".green(),
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}
