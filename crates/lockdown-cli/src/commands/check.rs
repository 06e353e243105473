//! Check command - classify hosts without recording anything

use super::Session;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use lockdown_core::Verdict;

/// Check command arguments
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Hosts to check
    #[arg(required = true)]
    pub hosts: Vec<String>,
}

/// Execute check command
pub fn execute(session: &Session, args: CheckArgs) -> Result<()> {
    let policy = session.policy();

    for host in &args.hosts {
        match policy.evaluate(host) {
            Verdict::Block { rule } => {
                println!("{} {} (rule: {})", "BLOCK".red().bold(), host, rule.cyan());
            }
            Verdict::Allow => {
                println!("{} {}", "ALLOW".green().bold(), host);
            }
        }
    }

    Ok(())
}
