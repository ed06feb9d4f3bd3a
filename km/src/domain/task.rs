//! Task domain types
//!
//! A Task is one unit of work to run against the external API via some
//! credential. The scheduler owns tasks after submission and is the only
//! mutator of `attempts` and `next_eligible_at`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::TaskError;

use super::Priority;

/// Unique task identifier (UUIDv7, so ids sort by submission time)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generate a fresh task id
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Executable payload: an opaque task description the API capability
/// interprets (e.g. kind `"followers"` with params `{"user_id": "..."}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPayload {
    /// Task kind, meaningful to the API capability
    pub kind: String,

    /// Kind-specific parameters
    pub params: Value,
}

impl TaskPayload {
    /// Create a new payload
    pub fn new(kind: impl Into<String>, params: Value) -> Self {
        Self {
            kind: kind.into(),
            params,
        }
    }
}

/// A scheduled unit of work
#[derive(Debug, Clone)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// What to execute
    pub payload: TaskPayload,

    /// Queue ordering within the eligible set
    pub priority: Priority,

    /// Executions so far (incremented at dispatch)
    pub attempts: u32,

    /// Attempt budget; the task exhausts when `attempts` reaches this
    pub max_attempts: u32,

    /// Earliest time this task may be dispatched
    pub next_eligible_at: Instant,

    /// Submission sequence number, assigned by the queue (FIFO tie-break)
    pub(crate) seq: u64,
}

impl Task {
    /// Create a new task, eligible immediately
    pub fn new(payload: TaskPayload, max_attempts: u32, priority: Priority) -> Self {
        Self {
            id: TaskId::generate(),
            payload,
            priority,
            attempts: 0,
            // A zero budget would make the task unrunnable
            max_attempts: max_attempts.max(1),
            next_eligible_at: Instant::now(),
            seq: 0,
        }
    }
}

/// Terminal, caller-visible result of a task
///
/// Every submitted task resolves into exactly one of these.
#[derive(Debug)]
pub enum TaskResult {
    /// The task succeeded; the result data from the API capability
    Completed(Value),

    /// The task will never run again; why
    Exhausted(TaskError),
}

impl TaskResult {
    /// Check if the task completed successfully
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskResult::Completed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_task_is_immediately_eligible() {
        let task = Task::new(TaskPayload::new("noop", Value::Null), 3, Priority::Normal);
        assert_eq!(task.attempts, 0);
        assert_eq!(task.max_attempts, 3);
        assert!(task.next_eligible_at <= Instant::now());
    }

    #[tokio::test]
    async fn test_zero_max_attempts_clamped_to_one() {
        let task = Task::new(TaskPayload::new("noop", Value::Null), 0, Priority::Normal);
        assert_eq!(task.max_attempts, 1);
    }

    #[test]
    fn test_task_ids_are_unique() {
        let a = TaskId::generate();
        let b = TaskId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_payload_serde_round_trip() {
        let payload = TaskPayload::new("followers", serde_json::json!({"user_id": "42"}));
        let json = serde_json::to_string(&payload).unwrap();
        let back: TaskPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind, "followers");
        assert_eq!(back.params["user_id"], "42");
    }
}
