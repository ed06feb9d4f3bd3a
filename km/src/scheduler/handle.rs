//! SchedulerHandle - client interface to the scheduler task

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::domain::{Priority, TaskId, TaskPayload, TaskResult};
use crate::error::SchedulerError;

use super::messages::{SchedulerRequest, SchedulerStatus};

/// Handle for callers to interact with a running scheduler
///
/// Cloneable; all operations are async and non-blocking. Dropping every
/// handle makes the scheduler drain and stop.
#[derive(Clone)]
pub struct SchedulerHandle {
    tx: mpsc::Sender<SchedulerRequest>,
}

impl SchedulerHandle {
    pub(crate) fn new(tx: mpsc::Sender<SchedulerRequest>) -> Self {
        Self { tx }
    }

    /// Submit a task for execution
    ///
    /// `max_attempts` and `priority` fall back to the scheduler's
    /// configured defaults when None. The returned [`TaskHandle`] resolves
    /// exactly once with the task's terminal result.
    pub async fn submit(
        &self,
        payload: TaskPayload,
        max_attempts: Option<u32>,
        priority: Option<Priority>,
    ) -> Result<TaskHandle, SchedulerError> {
        let id = TaskId::generate();
        debug!(task_id = %id, kind = %payload.kind, "SchedulerHandle::submit: called");
        let (result_tx, result_rx) = oneshot::channel();

        self.tx
            .send(SchedulerRequest::Submit {
                id,
                payload,
                max_attempts,
                priority,
                result_tx,
            })
            .await
            .map_err(|_| SchedulerError::ChannelClosed)?;

        Ok(TaskHandle { id, rx: result_rx })
    }

    /// Snapshot the scheduler's current state
    pub async fn status(&self) -> Result<SchedulerStatus, SchedulerError> {
        debug!("SchedulerHandle::status: called");
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(SchedulerRequest::Status { reply: reply_tx })
            .await
            .map_err(|_| SchedulerError::ChannelClosed)?;

        reply_rx.await.map_err(|_| SchedulerError::ChannelClosed)
    }

    /// Request shutdown and wait until the scheduler has stopped
    ///
    /// In-flight tasks get `grace` to finish; tasks still unresolved at
    /// exit resolve as exhausted with a shutdown error.
    pub async fn shutdown(&self, grace: Duration) -> Result<(), SchedulerError> {
        debug!(?grace, "SchedulerHandle::shutdown: called");
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(SchedulerRequest::Shutdown {
                grace,
                reply: reply_tx,
            })
            .await
            .map_err(|_| SchedulerError::ChannelClosed)?;

        reply_rx.await.map_err(|_| SchedulerError::ChannelClosed)
    }
}

/// Caller-side handle to one submitted task
///
/// Await it for the terminal result, or poll with [`TaskHandle::try_result`].
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    rx: oneshot::Receiver<TaskResult>,
}

impl TaskHandle {
    /// The task's identifier
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Wait for the task's terminal result
    pub async fn await_result(self) -> Result<TaskResult, SchedulerError> {
        self.rx.await.map_err(|_| SchedulerError::ChannelClosed)
    }

    /// Poll for the terminal result without waiting
    pub fn try_result(&mut self) -> Option<TaskResult> {
        self.rx.try_recv().ok()
    }
}
