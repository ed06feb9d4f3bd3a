//! Message and status types for the scheduler

use std::time::Duration;

use tokio::sync::oneshot;

use crate::domain::{Priority, TaskId, TaskPayload, TaskResult};
use crate::pool::SlotStatus;

/// Requests sent from handles to the scheduler task
#[derive(Debug)]
pub enum SchedulerRequest {
    /// Submit a new task
    Submit {
        id: TaskId,
        payload: TaskPayload,
        /// Attempt budget; scheduler default when None
        max_attempts: Option<u32>,
        /// Queue priority; scheduler default when None
        priority: Option<Priority>,
        /// Resolved exactly once with the task's terminal result
        result_tx: oneshot::Sender<TaskResult>,
    },

    /// Snapshot current slot states, queue depth, and stats
    Status { reply: oneshot::Sender<SchedulerStatus> },

    /// Stop dispatching, drain in-flight tasks within the grace period,
    /// then exit
    Shutdown {
        grace: Duration,
        reply: oneshot::Sender<()>,
    },
}

/// Statistics for the scheduler
#[derive(Debug, Default, Clone)]
pub struct SchedulerStats {
    pub total_submitted: u64,
    pub total_completed: u64,
    pub total_exhausted: u64,
    pub total_retries: u64,
    pub total_rate_limited: u64,
    pub peak_in_flight: usize,
    pub peak_queue_depth: usize,
}

/// Observability snapshot of the scheduler
#[derive(Debug, Clone)]
pub struct SchedulerStatus {
    /// Per-slot credential states
    pub slots: Vec<SlotStatus>,

    /// Tasks eligible to run now
    pub queued: usize,

    /// Tasks waiting on a future due time (backoff or not yet promoted)
    pub delayed: usize,

    /// Tasks currently executing
    pub in_flight: usize,

    pub stats: SchedulerStats,
}
