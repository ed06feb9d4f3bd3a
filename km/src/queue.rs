//! Task queue
//!
//! Ordered backlog of pending and retrying tasks. Eligible tasks (due now)
//! sit in a list ordered by priority then submission order; future-dated
//! tasks wait in a min-heap keyed by due time and are promoted when due.
//! Tasks only ever leave through `next_eligible` - the queue never drops one.

use std::collections::{BinaryHeap, VecDeque};

use tokio::time::Instant;
use tracing::debug;

use crate::domain::Task;

/// Heap entry ordering delayed tasks by due time (earliest first)
#[derive(Debug)]
struct DelayedEntry {
    due_at: Instant,
    seq: u64,
    task: Task,
}

impl Eq for DelayedEntry {}

impl PartialEq for DelayedEntry {
    fn eq(&self, other: &Self) -> bool {
        self.due_at == other.due_at && self.seq == other.seq
    }
}

impl Ord for DelayedEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Reversed so BinaryHeap (a max-heap) pops the earliest due entry;
        // FIFO by sequence among equal due times
        other
            .due_at
            .cmp(&self.due_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for DelayedEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// FIFO backlog with priority classes and delayed re-entry
#[derive(Debug, Default)]
pub struct TaskQueue {
    /// Tasks eligible to run, ordered by (priority desc, seq asc)
    eligible: VecDeque<Task>,

    /// Tasks with a future `next_eligible_at`
    delayed: BinaryHeap<DelayedEntry>,

    /// Submission counter; assigned once per task, kept across requeues
    next_seq: u64,
}

impl TaskQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Total task count, eligible and delayed
    pub fn len(&self) -> usize {
        self.eligible.len() + self.delayed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eligible.is_empty() && self.delayed.is_empty()
    }

    /// Count of tasks due now (as of the last promotion)
    pub fn eligible_len(&self) -> usize {
        self.eligible.len()
    }

    /// Count of future-dated tasks
    pub fn delayed_len(&self) -> usize {
        self.delayed.len()
    }

    /// Append a newly submitted task, eligible immediately
    pub fn submit(&mut self, mut task: Task) {
        task.seq = self.next_seq;
        self.next_seq += 1;
        task.next_eligible_at = Instant::now();
        debug!(task_id = %task.id, seq = task.seq, priority = %task.priority, "TaskQueue::submit: called");
        self.insert_eligible(task);
    }

    /// Remove and return the next task due at `now`, if any
    ///
    /// Highest priority class first, FIFO (submission order) within a
    /// class. Returns None when nothing is due yet, even if delayed tasks
    /// remain.
    pub fn next_eligible(&mut self, now: Instant) -> Option<Task> {
        self.promote_due(now);
        let task = self.eligible.pop_front();
        if let Some(task) = &task {
            debug!(task_id = %task.id, attempts = task.attempts, "TaskQueue::next_eligible: returning task");
        }
        task
    }

    /// Re-insert a task after a retryable outcome
    ///
    /// Sets `next_eligible_at = now + delay`. The task keeps its original
    /// submission sequence, so once due it slots back into FIFO order
    /// relative to its peers.
    pub fn requeue(&mut self, mut task: Task, delay: std::time::Duration) {
        let now = Instant::now();
        task.next_eligible_at = now + delay;
        debug!(task_id = %task.id, ?delay, attempts = task.attempts, "TaskQueue::requeue: called");

        if delay.is_zero() {
            self.insert_eligible(task);
        } else {
            self.delayed.push(DelayedEntry {
                due_at: task.next_eligible_at,
                seq: task.seq,
                task,
            });
        }
    }

    /// Earliest due time among delayed tasks
    pub fn next_due(&self) -> Option<Instant> {
        self.delayed.peek().map(|entry| entry.due_at)
    }

    /// Move delayed tasks whose due time has passed into the eligible list
    fn promote_due(&mut self, now: Instant) {
        while let Some(entry) = self.delayed.peek() {
            if entry.due_at > now {
                break;
            }
            let entry = self.delayed.pop().unwrap();
            debug!(task_id = %entry.task.id, "TaskQueue::promote_due: task now eligible");
            self.insert_eligible(entry.task);
        }
    }

    /// Insert into the eligible list keeping (priority desc, seq asc) order
    fn insert_eligible(&mut self, task: Task) {
        let position = self
            .eligible
            .iter()
            .position(|t| {
                t.priority < task.priority || (t.priority == task.priority && t.seq > task.seq)
            })
            .unwrap_or(self.eligible.len());
        self.eligible.insert(position, task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Priority, TaskPayload};
    use serde_json::Value;
    use std::time::Duration;
    use tokio::time;

    fn task(priority: Priority) -> Task {
        Task::new(TaskPayload::new("noop", Value::Null), 3, priority)
    }

    #[tokio::test]
    async fn test_fifo_within_priority_class() {
        let mut queue = TaskQueue::new();
        let first = task(Priority::Normal);
        let second = task(Priority::Normal);
        let (first_id, second_id) = (first.id, second.id);

        queue.submit(first);
        queue.submit(second);

        assert_eq!(queue.next_eligible(Instant::now()).unwrap().id, first_id);
        assert_eq!(queue.next_eligible(Instant::now()).unwrap().id, second_id);
        assert!(queue.next_eligible(Instant::now()).is_none());
    }

    #[tokio::test]
    async fn test_higher_priority_first() {
        let mut queue = TaskQueue::new();
        let normal = task(Priority::Normal);
        let high = task(Priority::High);
        let high_id = high.id;

        queue.submit(normal);
        queue.submit(high);

        assert_eq!(queue.next_eligible(Instant::now()).unwrap().id, high_id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_task_held_until_due() {
        let mut queue = TaskQueue::new();
        let t = task(Priority::Normal);
        let id = t.id;
        queue.submit(t);

        let t = queue.next_eligible(Instant::now()).unwrap();
        queue.requeue(t, Duration::from_secs(5));

        // Not yet due: queue is non-empty but nothing eligible
        assert!(queue.next_eligible(Instant::now()).is_none());
        assert_eq!(queue.len(), 1);
        assert!(queue.next_due().is_some());

        time::advance(Duration::from_secs(5)).await;
        assert_eq!(queue.next_eligible(Instant::now()).unwrap().id, id);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_zero_delay_requeue_rejoins_fifo_by_submission_order() {
        let mut queue = TaskQueue::new();
        let a = task(Priority::Normal);
        let b = task(Priority::Normal);
        let (a_id, b_id) = (a.id, b.id);

        queue.submit(a);
        queue.submit(b);

        // A runs, gets rate limited, requeues with zero delay
        let a = queue.next_eligible(Instant::now()).unwrap();
        queue.requeue(a, Duration::ZERO);

        // A was submitted before B, so it comes back ahead of B
        assert_eq!(queue.next_eligible(Instant::now()).unwrap().id, a_id);
        assert_eq!(queue.next_eligible(Instant::now()).unwrap().id, b_id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_promotion_preserves_fifo_among_equal_due_times() {
        let mut queue = TaskQueue::new();
        let a = task(Priority::Normal);
        let b = task(Priority::Normal);
        let (a_id, b_id) = (a.id, b.id);

        queue.submit(a);
        queue.submit(b);

        let a = queue.next_eligible(Instant::now()).unwrap();
        let b = queue.next_eligible(Instant::now()).unwrap();
        queue.requeue(b, Duration::from_secs(1));
        queue.requeue(a, Duration::from_secs(1));

        time::advance(Duration::from_secs(1)).await;
        assert_eq!(queue.next_eligible(Instant::now()).unwrap().id, a_id);
        assert_eq!(queue.next_eligible(Instant::now()).unwrap().id, b_id);
    }

    #[tokio::test]
    async fn test_duplicate_payloads_are_independent_tasks() {
        let mut queue = TaskQueue::new();
        let payload = TaskPayload::new("followers", serde_json::json!({"user_id": "1"}));
        queue.submit(Task::new(payload.clone(), 3, Priority::Normal));
        queue.submit(Task::new(payload, 3, Priority::Normal));

        assert_eq!(queue.len(), 2);
        let first = queue.next_eligible(Instant::now()).unwrap();
        let second = queue.next_eligible(Instant::now()).unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_counts() {
        let mut queue = TaskQueue::new();
        assert!(queue.is_empty());

        queue.submit(task(Priority::Normal));
        queue.submit(task(Priority::Normal));
        let t = queue.next_eligible(Instant::now()).unwrap();
        queue.requeue(t, Duration::from_secs(60));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.eligible_len(), 1);
        assert_eq!(queue.delayed_len(), 1);
    }
}
