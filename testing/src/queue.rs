//! In-memory deferred task queue.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use registrar_core::scheduler::{
    DeferredTask, ScheduledTask, SchedulingError, TaskId, TaskQueue,
};
use tokio::sync::Mutex;

/// Lifecycle of a queued task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    /// Waiting for its run time
    Pending,
    /// Handed to a worker
    Claimed,
    /// Finished
    Completed,
    /// Finished with an error
    Failed(String),
}

/// A task with its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedTask {
    /// The scheduled task
    pub scheduled: ScheduledTask,
    /// Current status
    pub status: TaskStatus,
    /// When the task was last claimed
    pub claimed_at: Option<DateTime<Utc>>,
}

/// In-memory `TaskQueue`.
#[derive(Debug, Default)]
pub struct InMemoryTaskQueue {
    tasks: Mutex<Vec<QueuedTask>>,
}

impl InMemoryTaskQueue {
    /// Empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every task
    pub async fn tasks(&self) -> Vec<QueuedTask> {
        self.tasks.lock().await.clone()
    }

    /// Tasks still waiting
    pub async fn pending(&self) -> Vec<ScheduledTask> {
        self.tasks
            .lock()
            .await
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .map(|t| t.scheduled.clone())
            .collect()
    }

    async fn set_status(&self, id: TaskId, status: TaskStatus) -> Result<(), SchedulingError> {
        let mut tasks = self.tasks.lock().await;
        let task = tasks
            .iter_mut()
            .find(|t| t.scheduled.id == id)
            .ok_or_else(|| SchedulingError::Backend(format!("unknown task {id}")))?;
        task.status = status;
        Ok(())
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    async fn schedule(
        &self,
        task: DeferredTask,
        run_at: DateTime<Utc>,
    ) -> Result<TaskId, SchedulingError> {
        let id = TaskId::new();
        self.tasks.lock().await.push(QueuedTask {
            scheduled: ScheduledTask { id, task, run_at },
            status: TaskStatus::Pending,
            claimed_at: None,
        });
        Ok(id)
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<ScheduledTask>, SchedulingError> {
        let mut tasks = self.tasks.lock().await;
        let mut due: Vec<&mut QueuedTask> = tasks
            .iter_mut()
            .filter(|t| t.status == TaskStatus::Pending && t.scheduled.run_at <= now)
            .collect();
        due.sort_by_key(|t| t.scheduled.run_at);

        Ok(due
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .map(|t| {
                t.status = TaskStatus::Claimed;
                t.claimed_at = Some(now);
                t.scheduled.clone()
            })
            .collect())
    }

    async fn complete(&self, id: TaskId) -> Result<(), SchedulingError> {
        self.set_status(id, TaskStatus::Completed).await
    }

    async fn fail(&self, id: TaskId, error: &str) -> Result<(), SchedulingError> {
        self.set_status(id, TaskStatus::Failed(error.to_string())).await
    }

    async fn release_stale(&self, claimed_before: DateTime<Utc>) -> Result<u64, SchedulingError> {
        let mut released = 0;
        for task in self.tasks.lock().await.iter_mut() {
            if task.status == TaskStatus::Claimed && task.claimed_at.is_some_and(|at| at < claimed_before) {
                task.status = TaskStatus::Pending;
                task.claimed_at = None;
                released += 1;
            }
        }
        Ok(released)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use registrar_core::scholarship::{ScholarshipReason, ScholarshipRequest};
    use registrar_core::types::EventId;

    fn task() -> DeferredTask {
        DeferredTask::ForwardScholarshipRequest {
            request: ScholarshipRequest {
                event_id: EventId::new(),
                tickets: Vec::new(),
                guardian: None,
                reason: ScholarshipReason::Other,
                reason_other: None,
            },
            note: "review".to_string(),
        }
    }

    #[tokio::test]
    async fn stale_claims_return_to_pending() {
        let queue = InMemoryTaskQueue::new();
        let now = Utc::now();
        let done = queue.schedule(task(), now).await.unwrap();
        let stuck = queue.schedule(task(), now).await.unwrap();

        assert_eq!(queue.claim_due(now, 10).await.unwrap().len(), 2);
        queue.complete(done).await.unwrap();

        assert_eq!(queue.release_stale(now).await.unwrap(), 0);
        assert_eq!(queue.release_stale(now + Duration::seconds(1)).await.unwrap(), 1);

        let reclaimed = queue.claim_due(now, 10).await.unwrap();
        assert_eq!(reclaimed.len(), 1);
        assert_eq!(reclaimed[0].id, stuck);
    }
}
