//! keymux - Credential-rotating task scheduler for rate-limited APIs
//!
//! keymux executes data-collection tasks against a rate-limited external API
//! using a pool of interchangeable credentials, so aggregate throughput
//! scales with the number of credentials rather than being capped by a
//! single credential's rate window.
//!
//! # Core Concepts
//!
//! - **One Task Per Slot**: each credential serves at most one in-flight
//!   task, keeping rate-limit accounting per credential exact
//! - **Due Times, Not Sleeps**: rate-limit resets and retry backoff are
//!   timestamps checked by the scheduler tick, never blocking sleeps
//! - **Every Task Resolves**: each submitted task resolves exactly once,
//!   as Completed or Exhausted - nothing is silently dropped
//!
//! # Modules
//!
//! - [`domain`] - Credential, Task, Outcome, Priority
//! - [`pool`] - CredentialPool and per-credential slot state
//! - [`queue`] - FIFO backlog with delayed (future-dated) tasks
//! - [`executor`] - adapter over the external API capability
//! - [`scheduler`] - the control loop and its client handle
//! - [`config`] - configuration types and loading

pub mod config;
pub mod domain;
pub mod error;
pub mod executor;
pub mod pool;
pub mod queue;
pub mod scheduler;

// Re-export commonly used types
pub use config::Config;
pub use domain::{Credential, Outcome, Priority, Task, TaskId, TaskPayload, TaskResult};
pub use error::{SchedulerError, TaskError};
pub use executor::{ApiCapability, Executor};
pub use pool::{Acquire, CredentialPool, SlotState};
pub use queue::TaskQueue;
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerHandle, SchedulerStatus, TaskHandle};
