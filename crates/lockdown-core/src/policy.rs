//! Per-request interception policy
//!
//! The proxy engine reports each request it sees. The policy matches the
//! host against a fresh merged block set; a match is recorded in the
//! metrics and the connection is disconnected. Anything else passes through
//! untouched. Evaluations share no match state, so the policy can be called
//! from any number of connection handlers at once.

use crate::filter::find_match;
use crate::metrics::MetricsLog;
use crate::rules::RuleStore;
use std::sync::Arc;
use tracing::{info, instrument, trace};

/// Outcome of evaluating a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Let the connection through unmodified
    Allow,
    /// Terminate the connection
    Block {
        /// Pattern that matched the host
        rule: String,
    },
}

impl Verdict {
    /// Check if this verdict blocks the connection
    pub fn is_block(&self) -> bool {
        matches!(self, Self::Block { .. })
    }
}

/// Socket handle owned by the proxy engine
#[cfg_attr(test, mockall::automock)]
pub trait ProxySocket: Send + Sync {
    /// Tear the connection down immediately
    fn force_disconnect(&self);
}

/// Events reported by the proxy engine for a proxied socket
#[derive(Clone, Copy)]
pub enum ProxyEvent<'a> {
    /// A socket was accepted
    SocketOpened,
    /// The client sent a request for `host`
    ReceivedRequest {
        /// Requested host name
        host: &'a str,
        /// Socket the request arrived on
        socket: &'a dyn ProxySocket,
    },
    /// The remote side is connected and data will be forwarded
    ReadyForForward,
    /// The socket was closed
    Disconnected,
}

impl std::fmt::Debug for ProxyEvent<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SocketOpened => f.write_str("SocketOpened"),
            Self::ReceivedRequest { host, .. } => f
                .debug_struct("ReceivedRequest")
                .field("host", host)
                .finish_non_exhaustive(),
            Self::ReadyForForward => f.write_str("ReadyForForward"),
            Self::Disconnected => f.write_str("Disconnected"),
        }
    }
}

/// Decides whether observed requests are blocked
#[derive(Clone)]
pub struct InterceptionPolicy {
    rules: Arc<dyn RuleStore>,
    metrics: Arc<MetricsLog>,
}

impl InterceptionPolicy {
    /// Create a policy over `rules`, recording blocks into `metrics`
    pub fn new(rules: Arc<dyn RuleStore>, metrics: Arc<MetricsLog>) -> Self {
        Self { rules, metrics }
    }

    /// Metrics log this policy records into
    pub fn metrics(&self) -> &MetricsLog {
        &self.metrics
    }

    /// Classify `host` without side effects
    pub fn evaluate(&self, host: &str) -> Verdict {
        let blocked = self.rules.merged_block_domains();
        match find_match(host, &blocked) {
            Some(rule) => Verdict::Block {
                rule: rule.to_string(),
            },
            None => Verdict::Allow,
        }
    }

    /// Handle a request for `host`
    ///
    /// On a match the block is recorded first and `disconnect` is called
    /// afterwards; otherwise neither happens.
    #[instrument(level = "trace", skip(self, disconnect))]
    pub fn on_request_observed<F>(&self, host: &str, disconnect: F) -> Verdict
    where
        F: FnOnce(),
    {
        let verdict = self.evaluate(host);
        if let Verdict::Block { rule } = &verdict {
            self.metrics.record_event_now(host);
            info!(host, rule = %rule, "Blocked session");
            disconnect();
        } else {
            trace!(host, "Allowed session");
        }
        verdict
    }

    /// Proxy engine observer entry point
    ///
    /// Only request events are acted upon.
    pub fn signal(&self, event: ProxyEvent<'_>) -> Option<Verdict> {
        match event {
            ProxyEvent::ReceivedRequest { host, socket } => {
                Some(self.on_request_observed(host, || socket.force_disconnect()))
            }
            ProxyEvent::SocketOpened | ProxyEvent::ReadyForForward | ProxyEvent::Disconnected => {
                None
            }
        }
    }
}

impl std::fmt::Debug for InterceptionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptionPolicy")
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}
