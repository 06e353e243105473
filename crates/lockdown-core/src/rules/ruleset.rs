//! Vendor rule set model

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::net::{Ipv4Addr, Ipv6Addr};
use tracing::{debug, warn};

/// Vendor-supplied rule set: named groups of block rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Rule groups keyed by name
    #[serde(rename = "lockdownDefaults", default)]
    pub groups: BTreeMap<String, RuleGroup>,
}

/// A named, independently switchable bundle of block rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleGroup {
    /// Only enabled groups contribute rules
    pub enabled: bool,
    /// Domain -> blocked flag
    #[serde(default)]
    pub domains: BTreeMap<String, bool>,
    /// Destination address -> range description
    #[serde(default)]
    pub ip_ranges: BTreeMap<String, IpRange>,
}

/// Address range attached to a destination address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRange {
    /// Dotted mask for IPv4, decimal prefix length for IPv6
    #[serde(rename = "subnetMask")]
    pub subnet_mask: String,
    /// Whether the destination is an IPv6 address
    #[serde(rename = "IPv6", default)]
    pub ipv6: bool,
}

/// IPv4 route to a blocked range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ipv4Route {
    /// Destination network address
    pub destination: Ipv4Addr,
    /// Network mask
    pub subnet_mask: Ipv4Addr,
}

impl Ipv4Route {
    /// The route covering every IPv4 destination
    pub const fn default_route() -> Self {
        Self {
            destination: Ipv4Addr::UNSPECIFIED,
            subnet_mask: Ipv4Addr::UNSPECIFIED,
        }
    }
}

/// IPv6 route to a blocked range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ipv6Route {
    /// Destination network address
    pub destination: Ipv6Addr,
    /// Network prefix length
    pub prefix_length: u8,
}

impl Ipv6Route {
    /// The route covering every IPv6 destination
    pub const fn default_route() -> Self {
        Self {
            destination: Ipv6Addr::UNSPECIFIED,
            prefix_length: 0,
        }
    }
}

impl RuleSet {
    /// Decode a persisted rule set
    ///
    /// The blob may be stored inline as a JSON object or as a string holding
    /// the encoded object. Anything missing or undecodable yields an empty
    /// rule set, which disables blocking rather than blocking everything.
    pub fn decode(value: Option<Value>) -> Self {
        let Some(value) = value else {
            debug!("No vendor rule set stored");
            return Self::default();
        };

        let decoded = match value {
            Value::String(encoded) => serde_json::from_str(&encoded),
            other => serde_json::from_value(other),
        };

        decoded.unwrap_or_else(|e| {
            warn!(error = %e, "Vendor rule set could not be decoded, using empty rule set");
            Self::default()
        })
    }

    /// Groups that contribute rules
    pub fn enabled_groups(&self) -> impl Iterator<Item = (&str, &RuleGroup)> {
        self.groups
            .iter()
            .filter(|(_, group)| group.enabled)
            .map(|(name, group)| (name.as_str(), group))
    }

    /// Blocked domains of all enabled groups, as stored
    pub fn blocked_domains(&self) -> impl Iterator<Item = &str> {
        self.enabled_groups().flat_map(|(_, group)| {
            group
                .domains
                .iter()
                .filter(|(_, blocked)| **blocked)
                .map(|(domain, _)| domain.as_str())
        })
    }

    /// IPv4 routes of all enabled groups
    ///
    /// Entries whose address or mask does not parse are dropped.
    pub fn ipv4_routes(&self) -> Vec<Ipv4Route> {
        let mut routes = Vec::new();
        for (name, group) in self.enabled_groups() {
            for (address, range) in group.ip_ranges.iter().filter(|(_, r)| !r.ipv6) {
                match (address.parse(), range.subnet_mask.parse()) {
                    (Ok(destination), Ok(subnet_mask)) => routes.push(Ipv4Route {
                        destination,
                        subnet_mask,
                    }),
                    _ => warn!(
                        group = name,
                        address = %address,
                        mask = %range.subnet_mask,
                        "Dropping malformed IPv4 range"
                    ),
                }
            }
        }
        routes
    }

    /// IPv6 routes of all enabled groups
    ///
    /// The mask field is read as a prefix length; entries where it is not a
    /// number in 0..=128, or whose address does not parse, are dropped.
    pub fn ipv6_routes(&self) -> Vec<Ipv6Route> {
        let mut routes = Vec::new();
        for (name, group) in self.enabled_groups() {
            for (address, range) in group.ip_ranges.iter().filter(|(_, r)| r.ipv6) {
                let prefix = range
                    .subnet_mask
                    .trim()
                    .parse::<u8>()
                    .ok()
                    .filter(|bits| *bits <= 128);
                match (address.parse(), prefix) {
                    (Ok(destination), Some(prefix_length)) => routes.push(Ipv6Route {
                        destination,
                        prefix_length,
                    }),
                    _ => warn!(
                        group = name,
                        address = %address,
                        prefix = %range.subnet_mask,
                        "Dropping malformed IPv6 range"
                    ),
                }
            }
        }
        routes
    }
}
