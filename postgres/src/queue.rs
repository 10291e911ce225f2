//! Durable deferred-task queue on the `scheduled_tasks` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use registrar_core::scheduler::{DeferredTask, ScheduledTask, SchedulingError, TaskId, TaskQueue};
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Status of a row in `scheduled_tasks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Waiting for its run time
    Pending,
    /// Claimed by a worker
    Claimed,
    /// Executed successfully
    Completed,
    /// Executed with an error (kept for inspection)
    Failed,
}

impl TaskStatus {
    /// Database representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Claimed => "claimed",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parse the database representation.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::Backend`] for an unknown status.
    pub fn parse(s: &str) -> Result<Self, SchedulingError> {
        match s {
            "pending" => Ok(Self::Pending),
            "claimed" => Ok(Self::Claimed),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(SchedulingError::Backend(format!("Invalid task status: {s}"))),
        }
    }
}

fn backend(error: sqlx::Error) -> SchedulingError {
    SchedulingError::Backend(error.to_string())
}

/// `PostgreSQL` task queue.
///
/// Claiming uses `FOR UPDATE SKIP LOCKED`, so several workers can poll the same table and
/// each due task is handed to exactly one of them. Rows whose payload no longer decodes
/// are marked failed in the claiming transaction; the rest of the batch is still claimed.
#[derive(Debug, Clone)]
pub struct PostgresTaskQueue {
    pool: PgPool,
}

impl PostgresTaskQueue {
    /// Queue over an existing pool
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Current status and error for a task.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::Backend`] if the query fails or the task is unknown.
    pub async fn status(&self, id: TaskId) -> Result<(TaskStatus, Option<String>), SchedulingError> {
        let row = sqlx::query("SELECT status, error FROM scheduled_tasks WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?
            .ok_or_else(|| SchedulingError::Backend(format!("Unknown task: {id}")))?;

        let status: String = row.try_get("status").map_err(backend)?;
        let error: Option<String> = row.try_get("error").map_err(backend)?;
        Ok((TaskStatus::parse(&status)?, error))
    }

    /// Number of tasks still waiting.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::Backend`] if the query fails.
    pub async fn count_pending(&self) -> Result<i64, SchedulingError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM scheduled_tasks WHERE status = 'pending'")
                .fetch_one(&self.pool)
                .await
                .map_err(backend)?;
        Ok(count)
    }

    async fn resolve(
        &self,
        id: TaskId,
        status: TaskStatus,
        error: Option<&str>,
    ) -> Result<(), SchedulingError> {
        let result = sqlx::query(
            r"
            UPDATE scheduled_tasks
            SET status = $2, error = $3, updated_at = now()
            WHERE id = $1 AND status = 'claimed'
            ",
        )
        .bind(*id.as_uuid())
        .bind(status.as_str())
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(SchedulingError::Backend(format!("Task {id} is not claimed")));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskQueue for PostgresTaskQueue {
    async fn schedule(
        &self,
        task: DeferredTask,
        run_at: DateTime<Utc>,
    ) -> Result<TaskId, SchedulingError> {
        let id = TaskId::new();
        let payload =
            serde_json::to_value(&task).map_err(|e| SchedulingError::Serialization(e.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO scheduled_tasks (id, kind, payload, run_at, status)
            VALUES ($1, $2, $3, $4, 'pending')
            ",
        )
        .bind(*id.as_uuid())
        .bind(task.kind())
        .bind(payload)
        .bind(run_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        tracing::debug!(task_id = %id, kind = task.kind(), run_at = %run_at, "Task scheduled");
        Ok(id)
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<ScheduledTask>, SchedulingError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let rows = sqlx::query(
            r"
            SELECT id, payload, run_at FROM scheduled_tasks
            WHERE status = 'pending' AND run_at <= $1
            ORDER BY run_at
            LIMIT $2
            FOR UPDATE SKIP LOCKED
            ",
        )
        .bind(now)
        .bind(i64::from(limit))
        .fetch_all(&mut *tx)
        .await
        .map_err(backend)?;

        let mut claimed = Vec::with_capacity(rows.len());
        let mut undecodable = Vec::new();
        for row in &rows {
            let id: Uuid = row.try_get("id").map_err(backend)?;
            let payload: serde_json::Value = row.try_get("payload").map_err(backend)?;
            let run_at: DateTime<Utc> = row.try_get("run_at").map_err(backend)?;
            match serde_json::from_value::<DeferredTask>(payload) {
                Ok(task) => claimed.push(ScheduledTask { id: TaskId::from_uuid(id), task, run_at }),
                Err(error) => {
                    tracing::error!(task_id = %id, error = %error, "Undecodable task payload");
                    undecodable.push((id, format!("Undecodable payload: {error}")));
                }
            }
        }

        if !claimed.is_empty() {
            let ids: Vec<Uuid> = claimed.iter().map(|task| *task.id.as_uuid()).collect();
            sqlx::query(
                r"
                UPDATE scheduled_tasks
                SET status = 'claimed', claimed_at = $2, updated_at = now()
                WHERE id = ANY($1)
                ",
            )
            .bind(ids)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        }

        for (id, error) in &undecodable {
            sqlx::query(
                "UPDATE scheduled_tasks SET status = 'failed', error = $2, updated_at = now() WHERE id = $1",
            )
            .bind(id)
            .bind(error)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        }

        tx.commit().await.map_err(backend)?;

        if !claimed.is_empty() {
            metrics::counter!("registrar_tasks_claimed_total").increment(claimed.len() as u64);
        }
        if !undecodable.is_empty() {
            metrics::counter!("registrar_tasks_undecodable_total").increment(undecodable.len() as u64);
        }
        Ok(claimed)
    }

    async fn complete(&self, id: TaskId) -> Result<(), SchedulingError> {
        self.resolve(id, TaskStatus::Completed, None).await
    }

    async fn fail(&self, id: TaskId, error: &str) -> Result<(), SchedulingError> {
        self.resolve(id, TaskStatus::Failed, Some(error)).await
    }

    async fn release_stale(&self, claimed_before: DateTime<Utc>) -> Result<u64, SchedulingError> {
        let result = sqlx::query(
            r"
            UPDATE scheduled_tasks
            SET status = 'pending', claimed_at = NULL, updated_at = now()
            WHERE status = 'claimed' AND claimed_at < $1
            ",
        )
        .bind(claimed_before)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        let released = result.rows_affected();
        if released > 0 {
            tracing::warn!(released, claimed_before = %claimed_before, "Released stale task claims");
            metrics::counter!("registrar_tasks_released_total").increment(released);
        }
        Ok(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_status_roundtrip() {
        for status in [TaskStatus::Pending, TaskStatus::Claimed, TaskStatus::Completed, TaskStatus::Failed] {
            assert_eq!(TaskStatus::parse(status.as_str()), Ok(status));
        }
    }

    #[test]
    fn task_status_invalid() {
        assert!(TaskStatus::parse("running").is_err());
    }
}
