//! Scheduler for credential-rotating task execution
//!
//! The control loop matching queued tasks to available credential slots,
//! with per-credential rate-limit tracking, retry with exponential backoff,
//! and bounded concurrency (one in-flight task per credential).

mod config;
mod core;
mod handle;
mod messages;

pub use config::SchedulerConfig;
pub use core::Scheduler;
pub use handle::{SchedulerHandle, TaskHandle};
pub use messages::{SchedulerRequest, SchedulerStats, SchedulerStatus};
