//! Configuration for the schedule coordinator.

use std::time::Duration;

/// Timer configuration for the schedule coordinator.
///
/// The defaults reproduce the production cadence: a 3 second debounce
/// on local edits, a 60 second push safety net, and a 300 second pull
/// to absorb changes made on other devices.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    /// Quiet period after the last "data changed" signal before a push.
    pub debounce: Duration,
    /// How often to push if anything is pending. Covers the case where
    /// the debounce timer was lost, e.g. an app reload.
    pub push_interval: Duration,
    /// How often to pull, unconditionally.
    pub pull_interval: Duration,
}

impl ScheduleConfig {
    /// Creates the default production configuration.
    pub fn new() -> Self {
        Self {
            debounce: Duration::from_secs(3),
            push_interval: Duration::from_secs(60),
            pull_interval: Duration::from_secs(300),
        }
    }

    /// Sets the debounce window.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Sets the periodic push interval.
    pub fn with_push_interval(mut self, interval: Duration) -> Self {
        self.push_interval = interval;
        self
    }

    /// Sets the periodic pull interval.
    pub fn with_pull_interval(mut self, interval: Duration) -> Self {
        self.pull_interval = interval;
        self
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self::new()
    }
}
