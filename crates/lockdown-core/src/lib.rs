//! # Lockdown Core
//!
//! Platform-independent decision layer for a local blocking proxy.
//!
//! ## Architecture
//!
//! This crate provides:
//! - **Settings** - Key/value persistence boundary shared with the host app
//! - **Rules** - Vendor and user rule sets merged into matchable patterns
//! - **Filter** - Literal suffix matching of hosts against patterns
//! - **Metrics** - Daily/weekly block counters and a capped day log
//! - **Policy** - Per-request decision that disconnects blocked sessions
//! - **PAC / Tunnel** - Proxy auto-config script and tunnel network settings
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use lockdown_core::settings::{keys, MemoryStore, SettingsStore};
//! use lockdown_core::{InterceptionPolicy, MetricsLog, SettingsRuleStore, Verdict};
//!
//! let store = Arc::new(MemoryStore::new());
//! store.set(keys::USER_LOCKDOWN_DOMAINS, serde_json::json!({ "ads.example.com": true })).unwrap();
//!
//! let rules = Arc::new(SettingsRuleStore::new(store.clone()));
//! let metrics = Arc::new(MetricsLog::new(store));
//! let policy = InterceptionPolicy::new(rules, metrics);
//!
//! let mut disconnected = false;
//! let verdict = policy.on_request_observed("x.ads.example.com", || disconnected = true);
//! assert!(disconnected);
//! assert!(matches!(verdict, Verdict::Block { .. }));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod filter;
pub mod metrics;
pub mod pac;
pub mod policy;
pub mod rules;
pub mod settings;
pub mod tunnel;

// Re-exports for convenience
pub use config::Config;
pub use error::{Error, Result};
pub use metrics::{MetricsLog, MetricsState};
pub use policy::{InterceptionPolicy, ProxyEvent, ProxySocket, Verdict};
pub use rules::{RuleStore, SettingsRuleStore};
pub use settings::{FileStore, MemoryStore, SettingsStore};
pub use tunnel::{ProxyEngine, TunnelProvider, TunnelSettings};
