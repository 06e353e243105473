//! Network settings assembly

use crate::config::TunnelConfig;
use crate::pac;
use crate::rules::{Ipv4Route, Ipv6Route, RuleStore};
use serde::Serialize;
use std::net::Ipv4Addr;

/// Complete settings for the tunnel interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TunnelSettings {
    /// Address the tunnel reports as its remote end
    pub remote_address: Ipv4Addr,
    /// IPv4 interface settings
    pub ipv4: Ipv4Settings,
    /// IPv6 interface settings
    pub ipv6: Ipv6Settings,
    /// Interface MTU
    pub mtu: u16,
    /// HTTP/HTTPS proxy settings
    pub proxy: ProxySettings,
}

/// IPv4 interface settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ipv4Settings {
    /// Interface addresses
    pub addresses: Vec<Ipv4Addr>,
    /// Masks matching `addresses`
    pub subnet_masks: Vec<Ipv4Addr>,
    /// Routes sent through the tunnel
    pub included_routes: Vec<Ipv4Route>,
    /// Ranges from enabled rule groups
    pub blocked_routes: Vec<Ipv4Route>,
}

/// IPv6 interface settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ipv6Settings {
    /// Interface addresses, as configured
    pub addresses: Vec<String>,
    /// Prefix lengths matching `addresses`
    pub network_prefix_lengths: Vec<u8>,
    /// Routes sent through the tunnel
    pub included_routes: Vec<Ipv6Route>,
    /// Ranges from enabled rule groups
    pub blocked_routes: Vec<Ipv6Route>,
}

/// Proxy server endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProxyServer {
    /// Listen address
    pub address: Ipv4Addr,
    /// Listen port
    pub port: u16,
}

/// System proxy settings installed with the tunnel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxySettings {
    /// Proxy plain HTTP
    pub http_enabled: bool,
    /// HTTP proxy endpoint
    pub http_server: ProxyServer,
    /// Proxy HTTPS (CONNECT)
    pub https_enabled: bool,
    /// HTTPS proxy endpoint
    pub https_server: ProxyServer,
    /// Send single-label host names directly
    pub exclude_simple_hostnames: bool,
    /// Hosts that never use the proxy
    pub exception_list: Vec<String>,
    /// Restrict proxying to these domains (None = all)
    pub match_domains: Option<Vec<String>>,
    /// Whether the PAC script is consulted
    pub auto_proxy_configuration_enabled: bool,
    /// PAC script
    pub proxy_auto_configuration_javascript: String,
}

impl TunnelSettings {
    /// Assemble the settings from configuration and the current rules
    pub fn build(config: &TunnelConfig, rules: &dyn RuleStore) -> Self {
        let server = ProxyServer {
            address: config.proxy_address,
            port: config.proxy_port,
        };

        Self {
            remote_address: config.proxy_address,
            ipv4: Ipv4Settings {
                addresses: vec![config.ipv4_address],
                subnet_masks: vec![config.ipv4_subnet_mask],
                included_routes: vec![Ipv4Route::default_route()],
                blocked_routes: rules.merged_block_ipv4_routes(),
            },
            ipv6: Ipv6Settings {
                addresses: vec![config.ipv6_address.clone()],
                network_prefix_lengths: vec![config.ipv6_prefix_length],
                included_routes: vec![Ipv6Route::default_route()],
                blocked_routes: rules.merged_block_ipv6_routes(),
            },
            mtu: config.mtu,
            proxy: ProxySettings {
                http_enabled: true,
                http_server: server,
                https_enabled: true,
                https_server: server,
                exclude_simple_hostnames: false,
                exception_list: Vec::new(),
                match_domains: None,
                auto_proxy_configuration_enabled: true,
                proxy_auto_configuration_javascript: pac::for_rules(rules),
            },
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string_pretty(self).map_err(crate::Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{keys, MemoryStore, SettingsStore};
    use crate::SettingsRuleStore;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_defaults_without_rules() {
        let rules = SettingsRuleStore::new(Arc::new(MemoryStore::new()));
        let settings = TunnelSettings::build(&TunnelConfig::default(), &rules);

        assert_eq!(settings.remote_address, Ipv4Addr::LOCALHOST);
        assert_eq!(settings.ipv4.addresses, vec![Ipv4Addr::new(10, 0, 0, 8)]);
        assert_eq!(settings.ipv4.included_routes, vec![Ipv4Route::default_route()]);
        assert!(settings.ipv4.blocked_routes.is_empty());
        assert_eq!(settings.ipv6.network_prefix_lengths, vec![64]);
        assert_eq!(settings.mtu, 1500);
        assert_eq!(settings.proxy.http_server.port, 9090);
        assert_eq!(settings.proxy.https_server, settings.proxy.http_server);
        assert!(settings.proxy.match_domains.is_none());
        assert_eq!(settings.proxy.proxy_auto_configuration_javascript, pac::DIRECT_SCRIPT);
    }

    #[test]
    fn test_rules_feed_routes_and_pac() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                keys::LOCKDOWN_DEFAULTS,
                json!({ "lockdownDefaults": { "g": {
                    "enabled": true,
                    "domains": { "ads.example.com": true },
                    "ipRanges": {
                        "192.0.2.0": { "subnetMask": "255.255.255.0", "IPv6": false },
                        "2001:db8::": { "subnetMask": "32", "IPv6": true }
                    }
                }}}),
            )
            .unwrap();
        let rules = SettingsRuleStore::new(store);

        let settings = TunnelSettings::build(&TunnelConfig::default(), &rules);

        assert_eq!(
            settings.ipv4.blocked_routes,
            vec![Ipv4Route {
                destination: Ipv4Addr::new(192, 0, 2, 0),
                subnet_mask: Ipv4Addr::new(255, 255, 255, 0),
            }]
        );
        assert_eq!(settings.ipv6.blocked_routes.len(), 1);
        assert_eq!(settings.proxy.proxy_auto_configuration_javascript, pac::PROXY_SCRIPT);
    }

    #[test]
    fn test_to_json() {
        let rules = SettingsRuleStore::new(Arc::new(MemoryStore::new()));
        let json = TunnelSettings::build(&TunnelConfig::default(), &rules)
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["mtu"], 1500);
        assert_eq!(value["proxy"]["http_server"]["address"], "127.0.0.1");
    }
}
