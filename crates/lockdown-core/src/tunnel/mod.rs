//! Tunnel network settings and proxy lifecycle
//!
//! At start the tunnel hands the OS one block of network settings: the
//! interface addresses, routes, MTU and the proxy configuration pointing at
//! the local proxy engine. The engine itself is an external collaborator
//! behind [`ProxyEngine`].

mod provider;
mod settings;

pub use provider::{ProxyEngine, TunnelProvider};
pub use settings::{Ipv4Settings, Ipv6Settings, ProxyServer, ProxySettings, TunnelSettings};
