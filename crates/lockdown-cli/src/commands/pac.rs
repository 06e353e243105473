//! PAC command - print the proxy auto-configuration script

use super::Session;
use anyhow::Result;

/// Execute pac command
pub fn execute(session: &Session) -> Result<()> {
    println!("{}", lockdown_core::pac::for_rules(&session.rules()));
    Ok(())
}
