//! Recording notification collaborators.

use async_trait::async_trait;
use registrar_core::Contact;
use registrar_core::notify::{
    NotifyError, ParticipantMessage, ScholarshipMessenger, StaffReport, TicketNotice,
    TicketNotifier,
};
use std::collections::HashSet;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct NoticeLog {
    waivers: Vec<TicketNotice>,
    webhooks: Vec<TicketNotice>,
}

/// Captures waiver reminders and ticket webhooks.
///
/// Deliveries for holders whose first name was passed to
/// [`RecordingNotifier::fail_for`] fail with [`NotifyError::Delivery`] and are not recorded.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    log: Mutex<NoticeLog>,
    failing: HashSet<String>,
}

impl RecordingNotifier {
    /// Notifier that records everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail deliveries for tickets held by `first_name`
    #[must_use]
    pub fn fail_for(mut self, first_name: &str) -> Self {
        self.failing.insert(first_name.to_string());
        self
    }

    /// Recorded waiver reminders
    pub async fn waivers(&self) -> Vec<TicketNotice> {
        self.log.lock().await.waivers.clone()
    }

    /// Recorded ticket webhooks
    pub async fn webhooks(&self) -> Vec<TicketNotice> {
        self.log.lock().await.webhooks.clone()
    }

    fn check(&self, notice: &TicketNotice) -> Result<(), NotifyError> {
        if self.failing.contains(&notice.ticket.first_name) {
            Err(NotifyError::Delivery(format!("refused {}", notice.ticket.first_name)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TicketNotifier for RecordingNotifier {
    async fn send_waiver_reminder(&self, notice: &TicketNotice) -> Result<(), NotifyError> {
        self.check(notice)?;
        self.log.lock().await.waivers.push(notice.clone());
        Ok(())
    }

    async fn send_ticket_webhook(&self, notice: &TicketNotice) -> Result<(), NotifyError> {
        self.check(notice)?;
        self.log.lock().await.webhooks.push(notice.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MessageLog {
    participants: Vec<(Contact, ParticipantMessage)>,
    staff: Vec<StaffReport>,
}

/// Captures scholarship messages.
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    log: Mutex<MessageLog>,
    fail_participants: bool,
}

impl RecordingMessenger {
    /// Messenger that records everything
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messenger whose participant deliveries fail (staff reports still recorded)
    #[must_use]
    pub fn failing_participants() -> Self {
        Self { fail_participants: true, ..Self::default() }
    }

    /// Recorded participant messages
    pub async fn participant_messages(&self) -> Vec<(Contact, ParticipantMessage)> {
        self.log.lock().await.participants.clone()
    }

    /// Recorded staff reports
    pub async fn staff_reports(&self) -> Vec<StaffReport> {
        self.log.lock().await.staff.clone()
    }
}

#[async_trait]
impl ScholarshipMessenger for RecordingMessenger {
    async fn message_participant(
        &self,
        contact: &Contact,
        message: &ParticipantMessage,
    ) -> Result<(), NotifyError> {
        if self.fail_participants {
            return Err(NotifyError::Delivery("participant channel down".to_string()));
        }
        self.log
            .lock()
            .await
            .participants
            .push((contact.clone(), message.clone()));
        Ok(())
    }

    async fn forward_to_staff(&self, report: &StaffReport) -> Result<(), NotifyError> {
        self.log.lock().await.staff.push(report.clone());
        Ok(())
    }
}
