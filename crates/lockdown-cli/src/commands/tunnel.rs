//! Tunnel command - print the network settings the tunnel would apply

use super::Session;
use anyhow::{Context, Result};
use lockdown_core::TunnelSettings;

/// Execute tunnel command
pub fn execute(session: &Session) -> Result<()> {
    let settings = TunnelSettings::build(&session.config.tunnel, &session.rules());
    let json = settings
        .to_json()
        .context("Failed to serialize tunnel settings")?;

    println!("{json}");
    Ok(())
}
