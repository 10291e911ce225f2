//! Registration persistence.
//!
//! The store owns the one step that must be atomic: [`RegistrationStore::issue`], which
//! re-checks capacity and promo limits under lock and inserts the payment, guardian
//! and tickets together.

use crate::error::RegistrationError;
use crate::types::{
    Event, EventId, GuardianInput, Money, PaymentId, PaymentProvider, Person, PromoCode,
    RedeemablePromo, Ticket, TicketId, TicketInput,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors from the persistence layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Stored data could not be decoded
    #[error("Data error: {0}")]
    Corrupt(String),
}

/// Why an issuance was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssueError {
    /// The event disappeared
    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    /// Registrations closed or capacity unknown at commit time
    #[error("Registrations closed")]
    RegistrationClosed,

    /// Seats ran out at commit time
    #[error("Only {remaining} tickets remain, {requested} requested")]
    CapacityExceeded {
        /// Seats still available
        remaining: u32,
        /// Tickets requested
        requested: u32,
    },

    /// The promo code ran out of uses at commit time
    #[error("Promo code {code} exhausted")]
    PromoExhausted {
        /// Code text
        code: String,
    },

    /// Persistence failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<IssueError> for RegistrationError {
    fn from(error: IssueError) -> Self {
        match error {
            IssueError::EventNotFound(id) => Self::EventNotFound(id),
            IssueError::RegistrationClosed => Self::RegistrationClosed,
            IssueError::CapacityExceeded { remaining, requested } => {
                Self::CapacityExceeded { remaining, requested }
            }
            IssueError::PromoExhausted { code } => Self::PromoExhausted { code },
            IssueError::Store(error) => Self::Store(error),
        }
    }
}

impl From<RegistrationError> for IssueError {
    /// Maps admission outcomes computed inside a store transaction.
    fn from(error: RegistrationError) -> Self {
        match error {
            RegistrationError::CapacityExceeded { remaining, requested } => {
                Self::CapacityExceeded { remaining, requested }
            }
            RegistrationError::EventNotFound(id) => Self::EventNotFound(id),
            RegistrationError::PromoExhausted { code } => Self::PromoExhausted { code },
            RegistrationError::Store(error) => Self::Store(error),
            _ => Self::RegistrationClosed,
        }
    }
}

/// Payment row to insert ahead of the tickets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    /// Provider that owns the intent
    pub provider: PaymentProvider,
    /// Provider-native intent ID
    pub intent_id: String,
    /// Amount charged, for auditing
    pub amount: Money,
}

/// One ticket to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTicket {
    /// Registrant payload
    pub input: TicketInput,
    /// Link the request's guardian to this ticket (minors only)
    pub needs_guardian: bool,
}

/// Everything inserted by one registration, as a single unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Issuance {
    /// Event the tickets are for
    pub event_id: EventId,
    /// Payment row (paid registrations only)
    pub payment: Option<NewPayment>,
    /// Guardian person (when supplied)
    pub guardian: Option<GuardianInput>,
    /// Tickets, in request order
    pub tickets: Vec<PendingTicket>,
    /// Promo code redeemed by every ticket
    pub promo: Option<PromoCode>,
    /// Creation timestamp for every inserted row
    pub created_at: DateTime<Utc>,
}

impl Issuance {
    /// Builds an issuance, marking minors (age below `majority_age`) for the guardian link.
    #[must_use]
    pub fn new(
        event: &Event,
        tickets: Vec<TicketInput>,
        guardian: Option<GuardianInput>,
        promo: Option<PromoCode>,
        payment: Option<NewPayment>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let majority = event.majority_age();
        let has_guardian = guardian.is_some();
        let tickets = tickets
            .into_iter()
            .map(|input| PendingTicket {
                needs_guardian: has_guardian && input.is_minor(majority),
                input,
            })
            .collect();

        Self { event_id: event.id, payment, guardian, tickets, promo, created_at }
    }

    /// Number of tickets requested
    #[must_use]
    pub fn requested(&self) -> u32 {
        u32::try_from(self.tickets.len()).unwrap_or(u32::MAX)
    }
}

/// Rows created by a successful issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedRegistration {
    /// Inserted payment row, if any
    pub payment_id: Option<PaymentId>,
    /// Inserted guardian, if any
    pub guardian: Option<Person>,
    /// Inserted tickets, in request order
    pub tickets: Vec<Ticket>,
}

/// A stored ticket together with its guardian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeldTicket {
    /// The ticket
    pub ticket: Ticket,
    /// Guardian linked to the ticket
    pub guardian: Option<Person>,
}

/// Registration store trait
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Loads an event with its venue.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn load_event(&self, event_id: EventId) -> Result<Option<Event>, StoreError>;

    /// Number of tickets currently held for an event.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn count_tickets(&self, event_id: EventId) -> Result<u32, StoreError>;

    /// Promo codes of an event whose normalized text equals `normalized_code`, with their
    /// redemption counts, in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn find_promo_codes(
        &self,
        event_id: EventId,
        normalized_code: &str,
    ) -> Result<Vec<RedeemablePromo>, StoreError>;

    /// Atomically inserts the payment, guardian and tickets of one registration.
    ///
    /// Implementations must serialize issuances per event and re-check, inside the same
    /// unit of work, that the event still admits the tickets and that the promo code
    /// (if any) has at least as many remaining uses as tickets requested.
    ///
    /// # Errors
    ///
    /// Returns [`IssueError`] if a limit is hit or persistence fails; nothing is written.
    async fn issue(&self, issuance: Issuance) -> Result<IssuedRegistration, IssueError>;

    /// Marks every payment row with this intent complete. Returns the rows touched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the update fails.
    async fn complete_payment(
        &self,
        provider: PaymentProvider,
        intent_id: &str,
    ) -> Result<u64, StoreError>;

    /// Tickets attached to payments with this intent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails.
    async fn tickets_for_intent(
        &self,
        provider: PaymentProvider,
        intent_id: &str,
    ) -> Result<Vec<HeldTicket>, StoreError>;

    /// Deletes tickets attached to payments with this intent. Returns the deleted IDs.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the delete fails.
    async fn delete_tickets_for_intent(
        &self,
        provider: PaymentProvider,
        intent_id: &str,
    ) -> Result<Vec<TicketId>, StoreError>;
}
