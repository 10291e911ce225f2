//! HTTP notification collaborators.
//!
//! Waiver reminders, ticket webhooks and scholarship messages are handed to external
//! services as JSON posts. An endpoint left unconfigured turns that delivery into a
//! logged no-op.

use crate::error::ClientError;
use crate::http::{self, DEFAULT_TIMEOUT};
use async_trait::async_trait;
use registrar_core::Contact;
use registrar_core::notify::{
    Channels, NotifyError, ParticipantMessage, ScholarshipMessenger, StaffReport, TicketNotice,
    TicketNotifier,
};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// Endpoints for ticket notices.
#[derive(Debug, Clone, Default)]
pub struct NotifierEndpoints {
    /// Waiver service (receives one reminder per ticket)
    pub waiver_url: Option<String>,
    /// Webhook fan-out service
    pub webhook_url: Option<String>,
    /// Participant messaging service (SMS, `WhatsApp`, e-mail)
    pub message_url: Option<String>,
    /// Staff inbox relay
    pub staff_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WaiverReminder<'a> {
    ticket_id: String,
    event_id: String,
    event_name: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    adult: bool,
    contact: &'a Contact,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TicketWebhook {
    event_id: String,
    title: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct OutgoingMessage<'a> {
    phone: Option<&'a str>,
    email: Option<&'a str>,
    subject: &'a str,
    body: &'a str,
}

/// Posts ticket notices and scholarship messages to configured endpoints.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    client: Client,
    endpoints: NotifierEndpoints,
}

impl HttpNotifier {
    /// Notifier with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Build`] if the HTTP client cannot be built.
    pub fn new(endpoints: NotifierEndpoints) -> Result<Self, ClientError> {
        Self::with_timeout(endpoints, DEFAULT_TIMEOUT)
    }

    /// Notifier with an explicit client timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Build`] if the HTTP client cannot be built.
    pub fn with_timeout(endpoints: NotifierEndpoints, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self { client: http::build_client(timeout)?, endpoints })
    }

    async fn post<T: Serialize + Sync>(
        &self,
        endpoint: Option<&str>,
        kind: &'static str,
        body: &T,
    ) -> Result<(), NotifyError> {
        let Some(url) = endpoint else {
            tracing::debug!(kind, "Notification endpoint not configured, skipping");
            return Ok(());
        };
        http::send(self.client.post(url).json(body)).await?;
        Ok(())
    }
}

#[async_trait]
impl TicketNotifier for HttpNotifier {
    async fn send_waiver_reminder(&self, notice: &TicketNotice) -> Result<(), NotifyError> {
        let contact = notice.waiver_contact();
        if contact.is_empty() {
            return Err(NotifyError::NoRecipient(notice.ticket.id.to_string()));
        }

        let body = WaiverReminder {
            ticket_id: notice.ticket.id.to_string(),
            event_id: notice.event.id.to_string(),
            event_name: &notice.event.name,
            first_name: &notice.ticket.first_name,
            last_name: &notice.ticket.last_name,
            adult: notice.is_adult(),
            contact,
        };
        self.post(self.endpoints.waiver_url.as_deref(), "waiver", &body).await
    }

    async fn send_ticket_webhook(&self, notice: &TicketNotice) -> Result<(), NotifyError> {
        let body = TicketWebhook {
            event_id: notice.event.id.to_string(),
            title: notice.webhook_title(),
            message: notice.webhook_message(),
        };
        self.post(self.endpoints.webhook_url.as_deref(), "webhook", &body).await
    }
}

#[async_trait]
impl ScholarshipMessenger for HttpNotifier {
    async fn message_participant(
        &self,
        contact: &Contact,
        message: &ParticipantMessage,
    ) -> Result<(), NotifyError> {
        let channels = Channels::for_contact(contact);
        if channels.is_empty() {
            return Err(NotifyError::NoRecipient("participant".to_string()));
        }

        let body = OutgoingMessage {
            phone: channels.phone.as_deref(),
            email: channels.email.as_deref(),
            subject: &message.subject,
            body: &message.body,
        };
        self.post(self.endpoints.message_url.as_deref(), "participant_message", &body)
            .await
    }

    async fn forward_to_staff(&self, report: &StaffReport) -> Result<(), NotifyError> {
        self.post(self.endpoints.staff_url.as_deref(), "staff_report", report).await
    }
}
