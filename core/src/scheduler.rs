//! Durable deferred tasks.
//!
//! Scholarship dispositions run minutes after the request. They are persisted through a
//! [`TaskQueue`] so a restart between decision and execution does not lose them.

use crate::scholarship::ScholarshipRequest;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Task queue error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    /// Backend operation failed
    #[error("Task queue error: {0}")]
    Backend(String),

    /// Task payload could not be encoded or decoded
    #[error("Task serialization error: {0}")]
    Serialization(String),
}

/// Unique identifier for a scheduled task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new random task ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Work to perform later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeferredTask {
    /// Hand a request that cannot be decided automatically to staff
    ForwardScholarshipRequest {
        /// Original request
        request: ScholarshipRequest,
        /// Why it needs a human
        note: String,
    },
    /// Tell every participant the scholarship was declined
    SendScholarshipRejection {
        /// Original request
        request: ScholarshipRequest,
        /// Decline reason appended to the message
        decline: String,
    },
    /// Register the participants at no charge, then confirm to them
    IssueScholarshipTickets {
        /// Original request
        request: ScholarshipRequest,
    },
}

impl DeferredTask {
    /// Short label for logs and metrics
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ForwardScholarshipRequest { .. } => "forward_scholarship_request",
            Self::SendScholarshipRejection { .. } => "send_scholarship_rejection",
            Self::IssueScholarshipTickets { .. } => "issue_scholarship_tickets",
        }
    }
}

/// A task claimed from the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    /// Task ID
    pub id: TaskId,
    /// Payload
    pub task: DeferredTask,
    /// Earliest execution time
    pub run_at: DateTime<Utc>,
}

/// Durable queue of deferred tasks.
///
/// A claimed task is handed to exactly one worker and then resolved with
/// [`TaskQueue::complete`] or [`TaskQueue::fail`]. Failed tasks are kept for inspection,
/// not retried. A claim that is never resolved (the worker died, or the resolve call
/// itself failed) is handed out again once [`TaskQueue::release_stale`] passes its
/// claim time.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Persists a task to run at (or after) `run_at`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError`] if the task cannot be stored.
    async fn schedule(&self, task: DeferredTask, run_at: DateTime<Utc>) -> Result<TaskId, SchedulingError>;

    /// Claims up to `limit` tasks due at `now`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError`] if the backend fails.
    async fn claim_due(&self, now: DateTime<Utc>, limit: u32) -> Result<Vec<ScheduledTask>, SchedulingError>;

    /// Marks a claimed task done.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError`] if the backend fails.
    async fn complete(&self, id: TaskId) -> Result<(), SchedulingError>;

    /// Marks a claimed task failed with a reason.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError`] if the backend fails.
    async fn fail(&self, id: TaskId, error: &str) -> Result<(), SchedulingError>;

    /// Moves tasks claimed before `claimed_before` that are still unresolved back to
    /// pending. Returns how many were released.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError`] if the backend fails.
    async fn release_stale(&self, claimed_before: DateTime<Utc>) -> Result<u64, SchedulingError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scholarship::ScholarshipReason;
    use crate::types::EventId;

    #[test]
    fn test_task_serializes_with_kind_tag() {
        let task = DeferredTask::IssueScholarshipTickets {
            request: ScholarshipRequest {
                event_id: EventId::new(),
                tickets: Vec::new(),
                guardian: None,
                reason: ScholarshipReason::CantAfford,
                reason_other: None,
            },
        };
        let json = serde_json::to_value(&task).unwrap_or_default();
        assert_eq!(json["kind"], "issue_scholarship_tickets");
        assert_eq!(json["request"]["reason"], "CANT_AFFORD");

        let back: Option<DeferredTask> = serde_json::from_value(json).ok();
        assert_eq!(back, Some(task));
    }
}
