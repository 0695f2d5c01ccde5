//! # Poll Policy
//!
//! Two-level backoff for the zone poller.
//!
//! ```text
//!            failure (count < threshold)
//!              ┌──────┐
//!              ▼      │
//!          ┌────────────┐  count reaches threshold  ┌────────────┐
//!   ──────▶│  Healthy   │──────────────────────────▶│  Degraded  │
//!          │ base (10s) │◀──────────────────────────│ slow (30s) │
//!          └────────────┘        one success        └────────────┘
//! ```
//!
//! The scheduler reads [`PollPolicy::interval`] before every sleep, so a
//! change of cadence takes effect on the next tick without recreating any
//! timer. The policy is deliberately not exponential: the slowest cadence
//! is bounded by `slow_interval`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    BASE_POLL_INTERVAL, FAILURE_THRESHOLD, FRESHNESS_WINDOW, SLOW_POLL_INTERVAL,
};

/// Poller configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Interval while healthy.
    #[serde(with = "duration_secs")]
    pub base_interval: Duration,
    /// Interval once `failure_threshold` consecutive failures are reached.
    #[serde(with = "duration_secs")]
    pub slow_interval: Duration,
    pub failure_threshold: u32,
    /// Zone data older than this disables purchases.
    #[serde(with = "duration_secs")]
    pub freshness_window: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            base_interval: BASE_POLL_INTERVAL,
            slow_interval: SLOW_POLL_INTERVAL,
            failure_threshold: FAILURE_THRESHOLD,
            freshness_window: FRESHNESS_WINDOW,
        }
    }
}

/// Cadence state machine: `{interval, consecutive failures}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    config: PollConfig,
    interval: Duration,
    consecutive_failures: u32,
}

/// What a recorded outcome did to the cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CadenceChange {
    Unchanged,
    Escalated,
    Reset,
}

impl PollPolicy {
    #[must_use]
    pub fn new(config: PollConfig) -> Self {
        Self {
            interval: config.base_interval,
            consecutive_failures: 0,
            config,
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    #[must_use]
    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.interval == self.config.slow_interval && self.interval != self.config.base_interval
    }

    /// Zeroes the failure count and returns to the base interval.
    pub fn record_success(&mut self) -> CadenceChange {
        let was_slow = self.interval != self.config.base_interval;
        self.consecutive_failures = 0;
        self.interval = self.config.base_interval;
        if was_slow {
            CadenceChange::Reset
        } else {
            CadenceChange::Unchanged
        }
    }

    /// Counts a failure; switches to the slow interval at the threshold.
    pub fn record_failure(&mut self) -> CadenceChange {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.consecutive_failures >= self.config.failure_threshold
            && self.interval != self.config.slow_interval
        {
            self.interval = self.config.slow_interval;
            return CadenceChange::Escalated;
        }
        CadenceChange::Unchanged
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(PollConfig::default())
    }
}

/// Serde adapter for durations written as whole seconds.
pub(crate) mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_base_interval() {
        let policy = PollPolicy::default();
        assert_eq!(policy.interval(), Duration::from_secs(10));
        assert_eq!(policy.consecutive_failures(), 0);
        assert!(!policy.is_degraded());
    }

    #[test]
    fn three_failures_escalate_then_one_success_resets() {
        let mut policy = PollPolicy::default();
        assert_eq!(policy.record_failure(), CadenceChange::Unchanged);
        assert_eq!(policy.record_failure(), CadenceChange::Unchanged);
        assert_eq!(policy.interval(), Duration::from_secs(10));
        assert_eq!(policy.record_failure(), CadenceChange::Escalated);
        assert_eq!(policy.interval(), Duration::from_secs(30));
        assert!(policy.is_degraded());

        // Further failures stay at the slow rate.
        assert_eq!(policy.record_failure(), CadenceChange::Unchanged);
        assert_eq!(policy.interval(), Duration::from_secs(30));
        assert_eq!(policy.consecutive_failures(), 4);

        assert_eq!(policy.record_success(), CadenceChange::Reset);
        assert_eq!(policy.interval(), Duration::from_secs(10));
        assert_eq!(policy.consecutive_failures(), 0);
    }

    #[test]
    fn success_below_threshold_only_clears_count() {
        let mut policy = PollPolicy::default();
        policy.record_failure();
        policy.record_failure();
        assert_eq!(policy.record_success(), CadenceChange::Unchanged);
        assert_eq!(policy.consecutive_failures(), 0);
        // Count restarted: two more failures are not enough.
        policy.record_failure();
        policy.record_failure();
        assert_eq!(policy.interval(), Duration::from_secs(10));
    }

    #[test]
    fn config_reads_seconds() {
        let cfg: PollConfig = toml::from_str(
            "base_interval = 5\nslow_interval = 20\nfailure_threshold = 2\nfreshness_window = 45",
        )
        .unwrap();
        assert_eq!(cfg.base_interval, Duration::from_secs(5));
        assert_eq!(cfg.slow_interval, Duration::from_secs(20));
        assert_eq!(cfg.failure_threshold, 2);
        assert_eq!(cfg.freshness_window, Duration::from_secs(45));

        let partial: PollConfig = toml::from_str("base_interval = 2").unwrap();
        assert_eq!(partial.slow_interval, Duration::from_secs(30));
    }
}
