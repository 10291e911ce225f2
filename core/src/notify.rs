//! Notification collaborators.
//!
//! Ticket notices (waiver reminder, ticket webhook) go out after tickets are final.
//! Scholarship messages go to participants and to staff. Delivery is always
//! best-effort from the orchestrator's point of view.

use crate::types::{Contact, Event, Person, Ticket};
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Notification delivery error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The collaborator could not be reached or refused the message
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// Nowhere to send the message
    #[error("No contact method for {0}")]
    NoRecipient(String),
}

/// A finalized ticket with the context collaborators need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketNotice {
    /// Event the ticket is for
    pub event: Event,
    /// The ticket
    pub ticket: Ticket,
    /// Guardian linked to the ticket
    pub guardian: Option<Person>,
}

impl TicketNotice {
    /// Whether the holder signs their own waiver.
    ///
    /// Holders without a linked guardian are treated as adults.
    #[must_use]
    pub fn is_adult(&self) -> bool {
        self.guardian.is_none()
            || self
                .ticket
                .age
                .is_some_and(|age| age >= self.event.majority_age())
    }

    /// Contact that should receive the waiver: the holder, or the guardian for minors.
    #[must_use]
    pub fn waiver_contact(&self) -> &Contact {
        match &self.guardian {
            Some(guardian) if !self.is_adult() => &guardian.contact,
            _ => &self.ticket.contact,
        }
    }

    /// Ticket webhook title
    #[must_use]
    pub fn webhook_title(&self) -> String {
        format!("New {} Registration", self.event.name)
    }

    /// Ticket webhook text: holder first name and last initial
    #[must_use]
    pub fn webhook_message(&self) -> String {
        let initial: String = self.ticket.last_name.chars().take(1).collect();
        format!(
            "{} {} registered for {}",
            self.ticket.first_name, initial, self.event.name
        )
    }
}

/// Waiver and webhook collaborator.
#[async_trait]
pub trait TicketNotifier: Send + Sync {
    /// Asks the waiver collaborator to remind the signer.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if delivery fails.
    async fn send_waiver_reminder(&self, notice: &TicketNotice) -> Result<(), NotifyError>;

    /// Posts the new-registration webhook.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if delivery fails.
    async fn send_ticket_webhook(&self, notice: &TicketNotice) -> Result<(), NotifyError>;
}

/// Message to one scholarship participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantMessage {
    /// E-mail subject
    pub subject: String,
    /// Text for e-mail and phone
    pub body: String,
}

/// Report for staff when a scholarship needs human handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffReport {
    /// Reason code plus free text
    pub reason: String,
    /// Why it was not handled automatically
    pub error: String,
    /// The original request, as JSON
    pub request: serde_json::Value,
}

/// Which channels a participant message should use.
///
/// WhatsApp wins over SMS; e-mail is sent in addition when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channels {
    /// `whatsapp:`-prefixed or plain phone number
    pub phone: Option<String>,
    /// E-mail address
    pub email: Option<String>,
}

impl Channels {
    /// Picks channels from a contact
    #[must_use]
    pub fn for_contact(contact: &Contact) -> Self {
        let non_blank = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let phone = non_blank(&contact.whatsapp)
            .map(|number| format!("whatsapp:{number}"))
            .or_else(|| non_blank(&contact.phone));

        Self { phone, email: non_blank(&contact.email) }
    }

    /// Whether no channel is available
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.phone.is_none() && self.email.is_none()
    }
}

/// Scholarship messaging collaborator (SMS / WhatsApp / e-mail, staff inbox).
#[async_trait]
pub trait ScholarshipMessenger: Send + Sync {
    /// Sends a message to a participant over [`Channels::for_contact`].
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if delivery fails.
    async fn message_participant(
        &self,
        contact: &Contact,
        message: &ParticipantMessage,
    ) -> Result<(), NotifyError>;

    /// Forwards a scholarship request to staff.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if delivery fails.
    async fn forward_to_staff(&self, report: &StaffReport) -> Result<(), NotifyError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventId, Money, PersonId, TicketId, TicketType};
    use chrono::Utc;

    fn notice(age: u8, with_guardian: bool) -> TicketNotice {
        let event = Event {
            id: EventId::new(),
            name: "Spring Hack".to_string(),
            region_webname: "seattle".to_string(),
            venue: None,
            ticket_price: Money::ZERO,
            early_bird_price: None,
            early_bird_cutoff: None,
            registrations_open: true,
            registration_cutoff: Utc::now(),
            min_age: None,
            max_age: None,
            majority_age: None,
            requires_promo_code: false,
        };
        let guardian = with_guardian.then(|| Person {
            id: PersonId::new(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            contact: Contact { email: Some("grace@example.com".to_string()), ..Contact::default() },
        });
        TicketNotice {
            ticket: Ticket {
                id: TicketId::new(),
                event_id: event.id,
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                age: Some(age),
                contact: Contact { email: Some("ada@example.com".to_string()), ..Contact::default() },
                ticket_type: TicketType::Student,
                guardian_id: guardian.as_ref().map(|g| g.id),
                payment_id: None,
                promo_code_id: None,
                created_at: Utc::now(),
            },
            event,
            guardian,
        }
    }

    #[test]
    fn test_minor_waiver_goes_to_guardian() {
        let minor = notice(15, true);
        assert!(!minor.is_adult());
        assert_eq!(minor.waiver_contact().email.as_deref(), Some("grace@example.com"));

        let adult = notice(19, true);
        assert!(adult.is_adult());
        assert_eq!(adult.waiver_contact().email.as_deref(), Some("ada@example.com"));

        assert!(notice(15, false).is_adult());
    }

    #[test]
    fn test_webhook_text() {
        let notice = notice(16, false);
        assert_eq!(notice.webhook_title(), "New Spring Hack Registration");
        assert_eq!(notice.webhook_message(), "Ada L registered for Spring Hack");
    }

    #[test]
    fn test_channels_prefer_whatsapp() {
        let contact = Contact {
            email: Some("ada@example.com".to_string()),
            phone: Some("+12065550100".to_string()),
            whatsapp: Some("+12065550199".to_string()),
        };
        let channels = Channels::for_contact(&contact);
        assert_eq!(channels.phone.as_deref(), Some("whatsapp:+12065550199"));
        assert_eq!(channels.email.as_deref(), Some("ada@example.com"));

        let sms_only = Contact { phone: Some("+12065550100".to_string()), ..Contact::default() };
        assert_eq!(Channels::for_contact(&sms_only).phone.as_deref(), Some("+12065550100"));
        assert!(Channels::for_contact(&Contact::default()).is_empty());
    }
}
