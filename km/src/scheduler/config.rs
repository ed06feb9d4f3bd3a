//! Scheduler configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::Priority;

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Base delay for retry backoff in milliseconds
    /// (attempt k retries after `base * 2^(k-1)`, capped)
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Upper bound on the retry backoff delay in milliseconds
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,

    /// Attempt budget for tasks submitted without one
    #[serde(default = "default_max_attempts")]
    pub default_max_attempts: u32,

    /// Consecutive fatal failures before a credential is disabled
    #[serde(default = "default_disable_after_fatals")]
    pub disable_after_fatals: u32,

    /// Stall watchdog interval in seconds (logged, never fatal)
    #[serde(default = "default_watchdog_interval_secs")]
    pub watchdog_interval_secs: u64,

    /// Grace period for in-flight tasks on shutdown, in seconds
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,

    /// Priority for tasks submitted without one
    #[serde(default)]
    pub default_priority: Priority,
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_backoff_cap_ms() -> u64 {
    60_000
}

fn default_max_attempts() -> u32 {
    5
}

fn default_disable_after_fatals() -> u32 {
    3
}

fn default_watchdog_interval_secs() -> u64 {
    30
}

fn default_shutdown_grace_secs() -> u64 {
    30
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            backoff_base_ms: default_backoff_base_ms(),
            backoff_cap_ms: default_backoff_cap_ms(),
            default_max_attempts: default_max_attempts(),
            disable_after_fatals: default_disable_after_fatals(),
            watchdog_interval_secs: default_watchdog_interval_secs(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
            default_priority: Priority::Normal,
        }
    }
}

impl SchedulerConfig {
    /// Get the backoff base as a Duration
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    /// Get the backoff cap as a Duration
    pub fn backoff_cap(&self) -> Duration {
        Duration::from_millis(self.backoff_cap_ms)
    }

    /// Get the watchdog interval as a Duration
    pub fn watchdog_interval(&self) -> Duration {
        Duration::from_secs(self.watchdog_interval_secs)
    }

    /// Get the shutdown grace period as a Duration
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}
