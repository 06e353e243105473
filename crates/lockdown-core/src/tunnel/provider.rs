//! Tunnel start/stop lifecycle

use super::settings::TunnelSettings;
use crate::config::TunnelConfig;
use crate::error::{Error, Result};
use crate::rules::RuleStore;
use std::net::SocketAddrV4;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Local HTTP/HTTPS proxy the tunnel routes traffic through
#[cfg_attr(test, mockall::automock)]
pub trait ProxyEngine: Send {
    /// Start listening on `listen`
    fn start(&mut self, listen: SocketAddrV4) -> Result<()>;

    /// Stop listening and drop all sessions
    fn stop(&mut self);
}

/// Owns the proxy engine for the lifetime of the tunnel
pub struct TunnelProvider<E: ProxyEngine> {
    config: TunnelConfig,
    rules: Arc<dyn RuleStore>,
    engine: E,
    running: bool,
}

impl<E: ProxyEngine> TunnelProvider<E> {
    /// Create a stopped provider
    pub fn new(config: TunnelConfig, rules: Arc<dyn RuleStore>, engine: E) -> Self {
        Self {
            config,
            rules,
            engine,
            running: false,
        }
    }

    /// Whether the engine was started and not stopped since
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start the tunnel
    ///
    /// A running engine is stopped first. Settings are built from the
    /// current rules, then the engine is started once; a start failure is
    /// returned as [`Error::TunnelStart`] without retrying.
    pub fn start(&mut self) -> Result<TunnelSettings> {
        if self.running {
            debug!("Stopping previous proxy engine");
            self.stop();
        }

        let settings = TunnelSettings::build(&self.config, self.rules.as_ref());
        let listen = SocketAddrV4::new(self.config.proxy_address, self.config.proxy_port);

        self.engine.start(listen).map_err(|e| {
            error!(%listen, "Proxy engine failed to start: {}", e);
            match e {
                Error::TunnelStart(_) => e,
                other => Error::tunnel_start(other.to_string()),
            }
        })?;
        self.running = true;

        info!(
            %listen,
            ipv4_blocked = settings.ipv4.blocked_routes.len(),
            ipv6_blocked = settings.ipv6.blocked_routes.len(),
            "Tunnel started"
        );
        Ok(settings)
    }

    /// Stop the tunnel; a no-op when already stopped
    pub fn stop(&mut self) {
        if self.running {
            self.engine.stop();
            self.running = false;
            info!("Tunnel stopped");
        }
    }
}

impl<E: ProxyEngine> Drop for TunnelProvider<E> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<E: ProxyEngine> std::fmt::Debug for TunnelProvider<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TunnelProvider")
            .field("config", &self.config)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}
