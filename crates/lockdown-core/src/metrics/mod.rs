//! Block metrics
//!
//! Counts blocked requests in three buckets (lifetime, current day, current
//! ISO week) and keeps a day log of `"<time>_<host>"` lines. Day and week
//! buckets roll over when the calendar day or week differs from the one
//! recorded last; they are reset, not carried over.
//!
//! Everything lives in the settings store so the host app can display it.
//! Recording is a no-op unless the app has enabled metrics.

mod state;

pub use state::MetricsState;

use crate::config::MetricsConfig;
use crate::settings::{keys, SettingsStore};
use chrono::{Local, NaiveDateTime};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{trace, warn};

/// Serialized writer for block metrics
///
/// Every update is a read-modify-write of several keys, so all updates go
/// through one mutex.
pub struct MetricsLog {
    store: Arc<dyn SettingsStore>,
    limits: MetricsConfig,
    write_lock: Mutex<()>,
}

impl MetricsLog {
    /// Create a metrics log with default day log limits
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self::with_limits(store, MetricsConfig::default())
    }

    /// Create a metrics log with custom day log limits
    pub fn with_limits(store: Arc<dyn SettingsStore>, limits: MetricsConfig) -> Self {
        Self {
            store,
            limits,
            write_lock: Mutex::new(()),
        }
    }

    /// Whether the host app has enabled metrics
    pub fn is_enabled(&self) -> bool {
        self.store.bool(keys::METRICS_ENABLED)
    }

    /// Record one blocked request at `now` (local wall-clock time)
    pub fn record_event(&self, label: &str, now: NaiveDateTime) {
        if !self.is_enabled() {
            return;
        }

        let _guard = self.write_lock.lock();
        let mut state = MetricsState::load(self.store.as_ref());
        state.record(label, now, &self.limits);
        trace!(total = state.total, day = state.day_count, week = state.week_count, "Recorded block");

        if let Err(e) = state.save(self.store.as_ref()) {
            warn!(error = %e, "Failed to persist block metrics");
        }
    }

    /// Record one blocked request at the current local time
    pub fn record_event_now(&self, label: &str) {
        self.record_event(label, Local::now().naive_local());
    }

    /// Current persisted metrics
    pub fn snapshot(&self) -> MetricsState {
        let _guard = self.write_lock.lock();
        MetricsState::load(self.store.as_ref())
    }

    /// Clear all counters and the day log
    pub fn reset(&self) -> crate::Result<()> {
        let _guard = self.write_lock.lock();
        MetricsState::default().save(self.store.as_ref())
    }
}

impl std::fmt::Debug for MetricsLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsLog")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}
