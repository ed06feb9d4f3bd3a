//! Error taxonomy
//!
//! Per-task failures stay inside [`TaskError`] and reach the caller only
//! through the task's terminal result. [`SchedulerError`] covers the
//! process-level conditions; pool exhaustion is the only failure the
//! control loop itself surfaces.

use thiserror::Error;

/// Why a task will never run again
#[derive(Debug, Error)]
pub enum TaskError {
    /// Non-retryable failure; exhausted immediately regardless of budget
    #[error("Fatal failure: {0}")]
    Fatal(String),

    /// Retry budget spent on transient failures
    #[error("Exhausted after {attempts} attempts, last error: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// Every credential is disabled; no task can ever run
    #[error("Credential pool exhausted")]
    PoolExhausted,

    /// Scheduler shut down before the task reached a terminal outcome
    #[error("Scheduler shut down before completion")]
    Shutdown,
}

impl TaskError {
    /// Check whether this is the process-level pool exhaustion condition
    pub fn is_pool_exhausted(&self) -> bool {
        matches!(self, TaskError::PoolExhausted)
    }
}

/// Process-level scheduler errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// All credentials disabled; no further progress possible
    #[error("All credentials disabled, pool exhausted")]
    PoolExhausted,

    /// The scheduler task is gone (channel closed)
    #[error("Scheduler channel closed")]
    ChannelClosed,
}
