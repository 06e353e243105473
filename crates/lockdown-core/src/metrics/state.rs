//! Persisted metrics state and its transitions

use crate::config::MetricsConfig;
use crate::error::Result;
use crate::settings::{keys, SettingsStore};
use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Day log line time prefix, e.g. `3:45 PM_`
const LOG_TIME_FORMAT: &str = "%-I:%M %p_";

/// Block counters and day log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsState {
    /// Lifetime blocks
    pub total: u64,
    /// Blocks during the active day
    pub day_count: u64,
    /// Day of month the day bucket belongs to (0 = never recorded)
    pub active_day: u32,
    /// Blocks during the active ISO week
    pub week_count: u64,
    /// ISO week the week bucket belongs to (0 = never recorded)
    pub active_week: u32,
    /// `"<time>_<host>"` lines for the active day, oldest first
    pub day_log: Vec<String>,
}

impl MetricsState {
    /// Read the state from the settings store
    ///
    /// Missing or malformed keys read as zero / empty.
    pub fn load(store: &dyn SettingsStore) -> Self {
        let count = |key| u64::try_from(store.integer(key)).unwrap_or(0);
        let marker = |key| u32::try_from(store.integer(key)).unwrap_or(0);

        Self {
            total: count(keys::TOTAL_METRICS),
            day_count: count(keys::DAY_METRICS),
            active_day: marker(keys::ACTIVE_DAY),
            week_count: count(keys::WEEK_METRICS),
            active_week: marker(keys::ACTIVE_WEEK),
            day_log: store.string_list(keys::DAY_LOGS).unwrap_or_default(),
        }
    }

    /// Write the state to the settings store
    pub fn save(&self, store: &dyn SettingsStore) -> Result<()> {
        store.set_many(vec![
            (keys::TOTAL_METRICS, json!(self.total)),
            (keys::DAY_METRICS, json!(self.day_count)),
            (keys::ACTIVE_DAY, json!(self.active_day)),
            (keys::DAY_LOGS, json!(self.day_log)),
            (keys::WEEK_METRICS, json!(self.week_count)),
            (keys::ACTIVE_WEEK, json!(self.active_week)),
        ])
    }

    /// Apply one blocked request at `now`
    ///
    /// The log cap is checked before appending, so the log can hold
    /// `max_log_size + 1` lines until the next event trims it.
    pub fn record(&mut self, label: &str, now: NaiveDateTime, limits: &MetricsConfig) {
        self.total += 1;

        let day = now.day();
        if day != self.active_day {
            self.day_count = 0;
            self.active_day = day;
            self.day_log.clear();
        }
        self.day_count += 1;

        if self.day_log.len() > limits.max_log_size {
            let excess = self.day_log.len().saturating_sub(limits.log_reduction);
            self.day_log.drain(..excess);
        }
        self.day_log
            .push(format!("{}{label}", now.format(LOG_TIME_FORMAT)));

        let week = now.iso_week().week();
        if week != self.active_week {
            self.week_count = 0;
            self.active_week = week;
        }
        self.week_count += 1;
    }
}
