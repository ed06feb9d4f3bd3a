//! Scheduler implementation
//!
//! An actor owning the credential pool, the task queue, and the in-flight
//! accounting. Clients talk to it through [`SchedulerHandle`] over a
//! channel; executor attempts run on spawned tasks and report back over a
//! completion channel, so all slot and queue mutation happens inside this
//! loop and never races.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::domain::{Credential, Outcome, Task, TaskId, TaskResult};
use crate::error::{SchedulerError, TaskError};
use crate::executor::{ApiCapability, Executor};
use crate::pool::{Acquire, CredentialPool, SlotHandle};
use crate::queue::TaskQueue;

use super::config::SchedulerConfig;
use super::handle::SchedulerHandle;
use super::messages::{SchedulerRequest, SchedulerStats, SchedulerStatus};

/// Buffer for handle requests
const REQUEST_BUFFER: usize = 256;

/// Tick while fully idle; real wake-ups come from channels and deadlines
const IDLE_TICK: Duration = Duration::from_secs(60);

/// Result of one dispatched attempt, reported by the spawned executor task
#[derive(Debug)]
struct Completion {
    task: Task,
    slot: SlotHandle,
    outcome: Outcome,
}

/// Shutdown in progress
struct ShutdownState {
    deadline: Instant,
    reply: Option<oneshot::Sender<()>>,
}

/// The scheduler: matches queued tasks to available credential slots
pub struct Scheduler {
    config: SchedulerConfig,
    pool: CredentialPool,
    queue: TaskQueue,
    executor: Executor,

    req_rx: mpsc::Receiver<SchedulerRequest>,
    /// True until every handle is dropped
    requests_open: bool,

    completion_tx: mpsc::Sender<Completion>,
    completion_rx: mpsc::Receiver<Completion>,

    /// Pending terminal-result senders, one per unresolved task
    waiters: HashMap<TaskId, oneshot::Sender<TaskResult>>,

    in_flight: usize,
    stats: SchedulerStats,
    shutdown: Option<ShutdownState>,

    /// Last dispatch or completion, for the stall watchdog
    last_progress: Instant,
}

impl Scheduler {
    /// Create a scheduler over the given credentials and API capability
    ///
    /// Returns the scheduler (drive it with [`Scheduler::run`]) and a
    /// cloneable handle for submitting tasks.
    pub fn new(
        credentials: Vec<Credential>,
        capability: Arc<dyn ApiCapability>,
        config: SchedulerConfig,
    ) -> (Self, SchedulerHandle) {
        debug!(credentials = credentials.len(), "Scheduler::new: called");
        let (req_tx, req_rx) = mpsc::channel(REQUEST_BUFFER);
        // Bounded by the concurrency cap: one completion per slot
        let (completion_tx, completion_rx) = mpsc::channel(credentials.len().max(1));

        let pool = CredentialPool::new(credentials, config.disable_after_fatals);

        let scheduler = Self {
            config,
            pool,
            queue: TaskQueue::new(),
            executor: Executor::new(capability),
            req_rx,
            requests_open: true,
            completion_tx,
            completion_rx,
            waiters: HashMap::new(),
            in_flight: 0,
            stats: SchedulerStats::default(),
            shutdown: None,
            last_progress: Instant::now(),
        };

        (scheduler, SchedulerHandle::new(req_tx))
    }

    /// Run the control loop until shutdown or pool exhaustion
    ///
    /// The loop never blocks except on the `select!` below, which wakes on
    /// the earliest of: a handle request, a completed attempt, a slot's
    /// rate window clearing, or a delayed task coming due.
    pub async fn run(mut self) -> Result<(), SchedulerError> {
        info!(slots = self.pool.len(), "Scheduler started");

        loop {
            self.pool.sweep(Instant::now());

            if self.shutdown.is_none() {
                self.dispatch_ready();
            }

            if self.pool.all_disabled() && self.in_flight == 0 {
                // Requests still buffered get their terminal answer too
                while let Ok(req) = self.req_rx.try_recv() {
                    self.handle_request(req);
                }
                warn!(
                    unresolved = self.waiters.len(),
                    "All credentials disabled, pool exhausted"
                );
                self.resolve_all(|| TaskError::PoolExhausted);
                if let Some(state) = self.shutdown.as_mut() {
                    if let Some(reply) = state.reply.take() {
                        let _ = reply.send(());
                    }
                }
                return Err(SchedulerError::PoolExhausted);
            }

            let grace_over = match &self.shutdown {
                Some(state) => self.in_flight == 0 || Instant::now() >= state.deadline,
                None => false,
            };
            if grace_over {
                self.finish_shutdown();
                return Ok(());
            }

            let deadline = self.next_deadline();
            tokio::select! {
                maybe_req = self.req_rx.recv(), if self.requests_open => {
                    match maybe_req {
                        Some(req) => self.handle_request(req),
                        None => {
                            debug!("Scheduler::run: all handles dropped, draining");
                            self.requests_open = false;
                            if self.shutdown.is_none() {
                                self.shutdown = Some(ShutdownState {
                                    deadline: Instant::now() + self.config.shutdown_grace(),
                                    reply: None,
                                });
                            }
                        }
                    }
                }
                Some(done) = self.completion_rx.recv() => {
                    self.handle_completion(done);
                }
                _ = time::sleep_until(deadline) => {
                    self.check_watchdog();
                }
            }
        }
    }

    /// Dispatch eligible tasks onto available slots until one side runs dry
    fn dispatch_ready(&mut self) {
        let now = Instant::now();
        loop {
            match self.pool.acquire() {
                Acquire::Slot(slot) => match self.queue.next_eligible(now) {
                    Some(mut task) => {
                        task.attempts += 1;
                        self.in_flight += 1;
                        self.stats.peak_in_flight = self.stats.peak_in_flight.max(self.in_flight);
                        self.last_progress = now;
                        debug!(
                            task_id = %task.id,
                            credential_id = %slot.credential_id(),
                            attempt = task.attempts,
                            "Scheduler::dispatch_ready: dispatching"
                        );

                        let executor = self.executor.clone();
                        let tx = self.completion_tx.clone();
                        tokio::spawn(async move {
                            let outcome = executor.execute(slot.credential(), &task.payload).await;
                            // Scheduler gone means no one left to report to
                            let _ = tx.send(Completion { task, slot, outcome }).await;
                        });
                    }
                    None => {
                        // Slot acquired but nothing to run on it
                        self.pool.release_unused(slot);
                        break;
                    }
                },
                Acquire::Busy | Acquire::Exhausted => break,
            }
        }
    }

    fn handle_request(&mut self, req: SchedulerRequest) {
        match req {
            SchedulerRequest::Submit {
                id,
                payload,
                max_attempts,
                priority,
                result_tx,
            } => {
                if self.shutdown.is_some() {
                    debug!(task_id = %id, "Scheduler::handle_request: submit during shutdown, rejecting");
                    let _ = result_tx.send(TaskResult::Exhausted(TaskError::Shutdown));
                    return;
                }

                let mut task = Task::new(
                    payload,
                    max_attempts.unwrap_or(self.config.default_max_attempts),
                    priority.unwrap_or(self.config.default_priority),
                );
                task.id = id;

                debug!(task_id = %task.id, priority = %task.priority, "Scheduler::handle_request: task submitted");
                self.stats.total_submitted += 1;
                self.waiters.insert(task.id, result_tx);
                self.queue.submit(task);
                self.stats.peak_queue_depth = self.stats.peak_queue_depth.max(self.queue.len());
            }
            SchedulerRequest::Status { reply } => {
                let _ = reply.send(self.status_snapshot());
            }
            SchedulerRequest::Shutdown { grace, reply } => {
                info!(?grace, in_flight = self.in_flight, "Scheduler: shutdown requested");
                match &mut self.shutdown {
                    None => {
                        self.shutdown = Some(ShutdownState {
                            deadline: Instant::now() + grace,
                            reply: Some(reply),
                        });
                    }
                    Some(_) => {
                        // Second shutdown request; first one wins the drain
                        let _ = reply.send(());
                    }
                }
            }
        }
    }

    /// Apply one attempt's outcome: release the slot, then complete,
    /// requeue, or exhaust the task
    fn handle_completion(&mut self, done: Completion) {
        let Completion { task, slot, outcome } = done;
        self.in_flight -= 1;
        self.last_progress = Instant::now();
        debug!(
            task_id = %task.id,
            credential_id = %slot.credential_id(),
            "Scheduler::handle_completion: called"
        );

        self.pool.release(slot, &outcome);

        match outcome {
            Outcome::Success(value) => {
                self.stats.total_completed += 1;
                self.resolve(task.id, TaskResult::Completed(value));
            }
            Outcome::RateLimited { .. } => {
                // The task did nothing wrong; immediately eligible again
                // for a different slot
                self.stats.total_rate_limited += 1;
                debug!(task_id = %task.id, "Scheduler::handle_completion: rate limited, requeue now");
                self.queue.requeue(task, Duration::ZERO);
                self.stats.peak_queue_depth = self.stats.peak_queue_depth.max(self.queue.len());
            }
            Outcome::Failure { error, retryable } => {
                if !retryable {
                    self.stats.total_exhausted += 1;
                    self.resolve(task.id, TaskResult::Exhausted(TaskError::Fatal(error)));
                } else if task.attempts < task.max_attempts {
                    let delay = self.backoff_delay(task.attempts);
                    debug!(
                        task_id = %task.id,
                        attempts = task.attempts,
                        ?delay,
                        "Scheduler::handle_completion: transient failure, backing off"
                    );
                    self.stats.total_retries += 1;
                    self.queue.requeue(task, delay);
                    self.stats.peak_queue_depth = self.stats.peak_queue_depth.max(self.queue.len());
                } else {
                    debug!(task_id = %task.id, attempts = task.attempts, "Scheduler::handle_completion: retries exhausted");
                    self.stats.total_exhausted += 1;
                    let attempts = task.attempts;
                    self.resolve(
                        task.id,
                        TaskResult::Exhausted(TaskError::RetriesExhausted {
                            attempts,
                            last_error: error,
                        }),
                    );
                }
            }
        }
    }

    /// Exponential backoff for the next retry: `base * 2^(attempts-1)`,
    /// capped
    fn backoff_delay(&self, attempts: u32) -> Duration {
        let exp = attempts.saturating_sub(1).min(16);
        let ms = self
            .config
            .backoff_base_ms
            .saturating_mul(1u64 << exp)
            .min(self.config.backoff_cap_ms);
        Duration::from_millis(ms)
    }

    /// Earliest instant at which the loop must look at the world again
    fn next_deadline(&self) -> Instant {
        let mut deadline = earlier(self.pool.next_reset(), self.queue.next_due());

        if let Some(state) = &self.shutdown {
            deadline = earlier(deadline, Some(state.deadline));
        }

        if self.stalled() {
            deadline = earlier(
                deadline,
                Some(self.last_progress + self.config.watchdog_interval()),
            );
        }

        deadline.unwrap_or_else(|| Instant::now() + IDLE_TICK)
    }

    /// Work pending but nothing dispatchable and nothing in flight
    fn stalled(&self) -> bool {
        !self.queue.is_empty() && self.in_flight == 0 && self.pool.available_count() == 0
    }

    fn check_watchdog(&mut self) {
        if self.shutdown.is_some() || !self.stalled() {
            return;
        }
        let now = Instant::now();
        if now.saturating_duration_since(self.last_progress) >= self.config.watchdog_interval() {
            warn!(
                queued = self.queue.len(),
                "Queue stalled: no eligible task and no available slot"
            );
            // Re-arm instead of warning every wake-up
            self.last_progress = now;
        }
    }

    fn status_snapshot(&self) -> SchedulerStatus {
        SchedulerStatus {
            slots: self.pool.snapshot(Instant::now()),
            queued: self.queue.eligible_len(),
            delayed: self.queue.delayed_len(),
            in_flight: self.in_flight,
            stats: self.stats.clone(),
        }
    }

    /// Resolve one task's terminal result
    fn resolve(&mut self, task_id: TaskId, result: TaskResult) {
        debug!(%task_id, completed = result.is_completed(), "Scheduler::resolve: task terminal");
        if let Some(tx) = self.waiters.remove(&task_id) {
            // Caller may have dropped their handle; that is their choice
            let _ = tx.send(result);
        }
    }

    /// Resolve every unresolved task with the given error
    fn resolve_all(&mut self, error: impl Fn() -> TaskError) {
        for (task_id, tx) in self.waiters.drain() {
            debug!(%task_id, "Scheduler::resolve_all: resolving as exhausted");
            self.stats.total_exhausted += 1;
            let _ = tx.send(TaskResult::Exhausted(error()));
        }
    }

    /// Process completions already in the channel, then resolve the rest
    fn finish_shutdown(&mut self) {
        while let Ok(done) = self.completion_rx.try_recv() {
            self.handle_completion(done);
        }
        // Buffered submits resolve as shutdown instead of dangling
        while let Ok(req) = self.req_rx.try_recv() {
            self.handle_request(req);
        }

        let unresolved = self.waiters.len();
        if unresolved > 0 {
            warn!(unresolved, "Shutdown grace elapsed with unresolved tasks");
        }
        self.resolve_all(|| TaskError::Shutdown);

        if let Some(state) = self.shutdown.as_mut() {
            if let Some(reply) = state.reply.take() {
                let _ = reply.send(());
            }
        }
        info!(
            completed = self.stats.total_completed,
            exhausted = self.stats.total_exhausted,
            "Scheduler stopped"
        );
    }
}

/// Earlier of two optional instants
fn earlier(a: Option<Instant>, b: Option<Instant>) -> Option<Instant> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}
