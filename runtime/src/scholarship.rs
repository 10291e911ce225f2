//! Scholarship disposition desk and deferred-task worker.
//!
//! [`ScholarshipDesk::request_scholarship`] decides the disposition and records it as a
//! [`DeferredTask`]; the [`DispositionWorker`] executes due tasks. Forwarded requests
//! are due immediately, rejections and approvals after a jittered delay.

use crate::metrics::ScholarshipMetrics;
use crate::registrar::Registrar;
use chrono::{DateTime, Utc};
use rand::Rng;
use registrar_core::error::Result;
use registrar_core::notify::{ParticipantMessage, ScholarshipMessenger, StaffReport};
use registrar_core::scheduler::{DeferredTask, ScheduledTask, SchedulingError, TaskQueue};
use registrar_core::scholarship::{
    DelayWindow, Disposition, DispositionDelays, ScholarshipRequest, ScholarshipWording,
    disposition,
};
use registrar_core::{PaymentProvider, RegistrationRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Note attached to requests whose reason has no automatic handling
pub const FORWARD_NOTE: &str = "Could not automatically handle this scholarship type.";

/// Scholarship desk configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScholarshipSettings {
    /// Delay windows
    pub delays: DispositionDelays,
    /// Participant wording
    pub wording: ScholarshipWording,
}

impl Default for ScholarshipSettings {
    fn default() -> Self {
        Self {
            delays: DispositionDelays::default(),
            wording: ScholarshipWording { organization: String::new() },
        }
    }
}

/// Takes scholarship requests and executes their deferred dispositions.
#[derive(Clone)]
pub struct ScholarshipDesk {
    registrar: Registrar,
    queue: Arc<dyn TaskQueue>,
    messenger: Arc<dyn ScholarshipMessenger>,
    settings: ScholarshipSettings,
}

impl ScholarshipDesk {
    /// Create a desk
    #[must_use]
    pub fn new(
        registrar: Registrar,
        queue: Arc<dyn TaskQueue>,
        messenger: Arc<dyn ScholarshipMessenger>,
        settings: ScholarshipSettings,
    ) -> Self {
        Self { registrar, queue, messenger, settings }
    }

    /// Task queue backing this desk
    #[must_use]
    pub fn queue(&self) -> &Arc<dyn TaskQueue> {
        &self.queue
    }

    /// Records the disposition for a request. Always `true` once recorded; the outcome
    /// reaches the participants asynchronously.
    ///
    /// # Errors
    ///
    /// Returns a scheduling error if the task queue rejects the task.
    pub async fn request_scholarship(&self, request: ScholarshipRequest) -> Result<bool> {
        let decision = disposition(request.reason);
        let now = self.registrar.environment().clock.now();
        let event_id = request.event_id;

        let (task, run_at) = match decision {
            Disposition::Forward => (
                DeferredTask::ForwardScholarshipRequest {
                    request,
                    note: FORWARD_NOTE.to_string(),
                },
                now,
            ),
            Disposition::Reject(decline) => (
                DeferredTask::SendScholarshipRejection { request, decline: decline.to_string() },
                jittered(now, self.settings.delays.rejection),
            ),
            Disposition::Approve => (
                DeferredTask::IssueScholarshipTickets { request },
                jittered(now, self.settings.delays.approval),
            ),
        };

        let kind = task.kind();
        let task_id = self.queue.schedule(task, run_at).await?;
        ScholarshipMetrics::record_disposition(decision);
        tracing::info!(
            event_id = %event_id,
            task_id = %task_id,
            disposition = decision.label(),
            kind,
            run_at = %run_at,
            "Scholarship disposition scheduled"
        );

        Ok(true)
    }

    /// Executes one deferred task.
    ///
    /// # Errors
    ///
    /// Returns a description of what could not be delivered.
    pub async fn execute(&self, task: &DeferredTask) -> std::result::Result<(), String> {
        match task {
            DeferredTask::ForwardScholarshipRequest { request, note } => {
                self.forward(request, note).await
            }
            DeferredTask::SendScholarshipRejection { request, decline } => {
                let message = ParticipantMessage {
                    subject: self.settings.wording.subject(),
                    body: self.settings.wording.rejection(decline),
                };
                self.message_all(request, &message).await
            }
            DeferredTask::IssueScholarshipTickets { request } => self.issue(request).await,
        }
    }

    async fn issue(&self, request: &ScholarshipRequest) -> std::result::Result<(), String> {
        let registration = RegistrationRequest {
            event_id: request.event_id,
            tickets: request.tickets.clone(),
            guardian: request.guardian.clone(),
            promo_code: None,
            provider: PaymentProvider::Stripe,
        };

        match self.registrar.register_waived(registration).await {
            Ok(registration) => {
                tracing::info!(
                    event_id = %request.event_id,
                    tickets = registration.tickets.len(),
                    "Scholarship tickets issued"
                );
                let message = ParticipantMessage {
                    subject: self.settings.wording.subject(),
                    body: self.settings.wording.approval(),
                };
                if let Err(error) = self.message_all(request, &message).await {
                    tracing::warn!(event_id = %request.event_id, error = %error, "Approval message failed");
                }
                Ok(())
            }
            Err(error) => {
                tracing::warn!(
                    event_id = %request.event_id,
                    code = error.code(),
                    error = %error,
                    "Scholarship issuance failed, forwarding to staff"
                );
                self.forward(request, &error.to_string()).await
            }
        }
    }

    async fn forward(&self, request: &ScholarshipRequest, note: &str) -> std::result::Result<(), String> {
        let report = StaffReport {
            reason: request.reason_summary(),
            error: note.to_string(),
            request: serde_json::to_value(request).unwrap_or(serde_json::Value::Null),
        };
        self.messenger
            .forward_to_staff(&report)
            .await
            .map_err(|error| error.to_string())
    }

    /// Messages every participant; keeps going after a failure and reports all of them.
    async fn message_all(
        &self,
        request: &ScholarshipRequest,
        message: &ParticipantMessage,
    ) -> std::result::Result<(), String> {
        let mut failures = Vec::new();
        for ticket in &request.tickets {
            if let Err(error) = self.messenger.message_participant(&ticket.contact, message).await {
                failures.push(format!("{}: {error}", ticket.first_name));
            }
        }

        if failures.is_empty() { Ok(()) } else { Err(failures.join("; ")) }
    }
}

impl std::fmt::Debug for ScholarshipDesk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScholarshipDesk")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// `now` plus a uniformly random delay within `window`.
fn jittered(now: DateTime<Utc>, window: DelayWindow) -> DateTime<Utc> {
    let secs = rand::thread_rng().gen_range(window.min.as_secs()..=window.max.as_secs());
    let delay = chrono::Duration::from_std(Duration::from_secs(secs)).unwrap_or(chrono::Duration::zero());
    now + delay
}

/// Worker configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Time between polls
    pub poll_interval: Duration,
    /// Tasks claimed per poll
    pub batch_size: u32,
    /// How long a claim may stay unresolved before the task is handed out again
    pub claim_lease: Duration,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(15),
            batch_size: 20,
            claim_lease: Duration::from_secs(10 * 60),
        }
    }
}

/// Polls the task queue and executes due dispositions.
pub struct DispositionWorker {
    desk: ScholarshipDesk,
    settings: WorkerSettings,
    shutdown: watch::Receiver<bool>,
}

impl DispositionWorker {
    /// Create a worker.
    ///
    /// Returns the worker and a shutdown sender. Send `true` to stop it.
    #[must_use]
    pub fn new(desk: ScholarshipDesk, settings: WorkerSettings) -> (Self, watch::Sender<bool>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        (Self { desk, settings, shutdown: shutdown_rx }, shutdown_tx)
    }

    /// Runs until the shutdown signal.
    pub async fn run(mut self) {
        tracing::info!(
            poll_interval_secs = self.settings.poll_interval.as_secs(),
            batch_size = self.settings.batch_size,
            claim_lease_secs = self.settings.claim_lease.as_secs(),
            "Disposition worker started"
        );
        let mut interval = tokio::time::interval(self.settings.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        tracing::info!("Disposition worker received shutdown signal");
                        break;
                    }
                }
                _ = interval.tick() => {
                    let now = self.desk.registrar.environment().clock.now();
                    if let Err(error) = self.run_due(now).await {
                        tracing::error!(error = %error, "Failed to poll deferred tasks");
                    }
                }
            }
        }
    }

    /// Releases claims older than the lease, then claims and executes every task due at
    /// `now`, one batch at a time. Returns the number of tasks executed.
    ///
    /// A task whose outcome cannot be recorded stays claimed and is released by a later
    /// call once its lease has passed; the rest of the batch still runs.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError`] if releasing or claiming fails.
    pub async fn run_due(&self, now: DateTime<Utc>) -> std::result::Result<usize, SchedulingError> {
        let lease_start = chrono::Duration::from_std(self.settings.claim_lease)
            .ok()
            .and_then(|lease| now.checked_sub_signed(lease));
        if let Some(claimed_before) = lease_start {
            let released = self.desk.queue.release_stale(claimed_before).await?;
            if released > 0 {
                tracing::warn!(released, "Re-queued deferred tasks whose claim expired");
            }
        }

        let mut executed = 0;
        loop {
            let batch = self.desk.queue.claim_due(now, self.settings.batch_size).await?;
            if batch.is_empty() {
                return Ok(executed);
            }
            for task in batch {
                self.run_one(task).await;
                executed += 1;
            }
        }
    }

    async fn run_one(&self, scheduled: ScheduledTask) {
        let kind = scheduled.task.kind();
        let resolved = match self.desk.execute(&scheduled.task).await {
            Ok(()) => {
                ScholarshipMetrics::record_task(kind, true);
                tracing::info!(task_id = %scheduled.id, kind, "Deferred task completed");
                self.desk.queue.complete(scheduled.id).await
            }
            Err(error) => {
                ScholarshipMetrics::record_task(kind, false);
                tracing::error!(task_id = %scheduled.id, kind, error = %error, "Deferred task failed");
                self.desk.queue.fail(scheduled.id, &error).await
            }
        };

        if let Err(error) = resolved {
            tracing::error!(
                task_id = %scheduled.id,
                kind,
                error = %error,
                "Failed to record deferred task outcome, task stays claimed until its lease expires"
            );
        }
    }
}

impl std::fmt::Debug for DispositionWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispositionWorker")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jitter_stays_in_window() {
        let now = Utc::now();
        let window = DelayWindow::from_secs(300, 600);
        for _ in 0..200 {
            let at = jittered(now, window);
            let delay = (at - now).num_seconds();
            assert!((300..=600).contains(&delay));
        }
    }

    #[test]
    fn test_zero_width_window() {
        let now = Utc::now();
        assert_eq!(jittered(now, DelayWindow::from_secs(0, 0)), now);
    }
}
