//! In-memory registration store.

use async_trait::async_trait;
use registrar_core::admission::admit;
use registrar_core::promo::normalize_code;
use registrar_core::store::{
    HeldTicket, IssueError, Issuance, IssuedRegistration, RegistrationStore, StoreError,
};
use registrar_core::{
    Event, EventId, Payment, PaymentId, PaymentProvider, Person, PersonId, PromoCode,
    RedeemablePromo, Ticket, TicketId,
};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// A row written by [`InMemoryStore::issue`], in write order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Write {
    /// Payment row
    Payment(PaymentId),
    /// Guardian row
    Person(PersonId),
    /// Ticket row
    Ticket(TicketId),
}

#[derive(Debug, Default)]
struct State {
    events: HashMap<EventId, Event>,
    promo_codes: Vec<PromoCode>,
    tickets: Vec<Ticket>,
    payments: Vec<Payment>,
    people: HashMap<PersonId, Person>,
    journal: Vec<Write>,
    failing: bool,
}

impl State {
    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing {
            Err(StoreError::Database("store unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    fn sold(&self, event_id: EventId) -> u32 {
        let count = self.tickets.iter().filter(|t| t.event_id == event_id).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    fn redemptions(&self, promo_id: registrar_core::PromoCodeId) -> u32 {
        let count = self
            .tickets
            .iter()
            .filter(|t| t.promo_code_id == Some(promo_id))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    fn payment_ids(&self, provider: PaymentProvider, intent_id: &str) -> Vec<PaymentId> {
        self.payments
            .iter()
            .filter(|p| p.provider == provider && p.intent_id == intent_id)
            .map(|p| p.id)
            .collect()
    }
}

/// In-memory `RegistrationStore`.
///
/// Issuance holds one lock for the whole unit of work, so concurrent registrations are
/// serialized exactly like the row-locked Postgres transaction.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an event
    pub async fn insert_event(&self, event: Event) {
        self.state.lock().await.events.insert(event.id, event);
    }

    /// Adds a promo code (creation order is insertion order)
    pub async fn insert_promo(&self, promo: PromoCode) {
        self.state.lock().await.promo_codes.push(promo);
    }

    /// Adds an existing ticket, bypassing admission
    pub async fn insert_ticket(&self, ticket: Ticket) {
        self.state.lock().await.tickets.push(ticket);
    }

    /// Makes every subsequent call fail with a database error
    pub async fn set_failing(&self, failing: bool) {
        self.state.lock().await.failing = failing;
    }

    /// Snapshot of all tickets
    pub async fn tickets(&self) -> Vec<Ticket> {
        self.state.lock().await.tickets.clone()
    }

    /// Snapshot of all payments
    pub async fn payments(&self) -> Vec<Payment> {
        self.state.lock().await.payments.clone()
    }

    /// Snapshot of all guardians
    pub async fn people(&self) -> Vec<Person> {
        self.state.lock().await.people.values().cloned().collect()
    }

    /// Rows written by issuances, in order
    pub async fn journal(&self) -> Vec<Write> {
        self.state.lock().await.journal.clone()
    }
}

#[async_trait]
impl RegistrationStore for InMemoryStore {
    async fn load_event(&self, event_id: EventId) -> Result<Option<Event>, StoreError> {
        let state = self.state.lock().await;
        state.check_available()?;
        Ok(state.events.get(&event_id).cloned())
    }

    async fn count_tickets(&self, event_id: EventId) -> Result<u32, StoreError> {
        let state = self.state.lock().await;
        state.check_available()?;
        Ok(state.sold(event_id))
    }

    async fn find_promo_codes(
        &self,
        event_id: EventId,
        normalized_code: &str,
    ) -> Result<Vec<RedeemablePromo>, StoreError> {
        let state = self.state.lock().await;
        state.check_available()?;
        Ok(state
            .promo_codes
            .iter()
            .filter(|p| p.event_id == event_id && normalize_code(&p.code) == normalized_code)
            .map(|p| RedeemablePromo { code: p.clone(), redemptions: state.redemptions(p.id) })
            .collect())
    }

    async fn issue(&self, issuance: Issuance) -> Result<IssuedRegistration, IssueError> {
        let mut state = self.state.lock().await;
        state.check_available()?;

        let event = state
            .events
            .get(&issuance.event_id)
            .cloned()
            .ok_or(IssueError::EventNotFound(issuance.event_id))?;
        let requested = issuance.requested();
        admit(&event, state.sold(event.id), requested)?;

        if let Some(promo) = &issuance.promo {
            let current = state.promo_codes.iter().find(|p| p.id == promo.id).cloned();
            let remaining = current
                .as_ref()
                .and_then(|p| p.uses)
                .map(|max| max.saturating_sub(state.redemptions(promo.id)));
            if current.is_none() || remaining.is_some_and(|remaining| remaining < requested) {
                return Err(IssueError::PromoExhausted { code: promo.code.clone() });
            }
        }

        let payment_id = issuance.payment.map(|payment| {
            let id = PaymentId::new();
            state.payments.push(Payment {
                id,
                provider: payment.provider,
                intent_id: payment.intent_id,
                complete: false,
                created_at: issuance.created_at,
            });
            state.journal.push(Write::Payment(id));
            id
        });

        let guardian = issuance.guardian.map(|input| {
            let person = Person {
                id: PersonId::new(),
                first_name: input.first_name,
                last_name: input.last_name,
                contact: input.contact,
            };
            state.people.insert(person.id, person.clone());
            state.journal.push(Write::Person(person.id));
            person
        });

        let promo_code_id = issuance.promo.as_ref().map(|p| p.id);
        let mut tickets = Vec::with_capacity(issuance.tickets.len());
        for pending in issuance.tickets {
            let ticket = Ticket {
                id: TicketId::new(),
                event_id: event.id,
                first_name: pending.input.first_name,
                last_name: pending.input.last_name,
                age: pending.input.age,
                contact: pending.input.contact,
                ticket_type: pending.input.ticket_type,
                guardian_id: guardian
                    .as_ref()
                    .filter(|_| pending.needs_guardian)
                    .map(|g| g.id),
                payment_id,
                promo_code_id,
                created_at: issuance.created_at,
            };
            state.journal.push(Write::Ticket(ticket.id));
            state.tickets.push(ticket.clone());
            tickets.push(ticket);
        }

        Ok(IssuedRegistration { payment_id, guardian, tickets })
    }

    async fn complete_payment(
        &self,
        provider: PaymentProvider,
        intent_id: &str,
    ) -> Result<u64, StoreError> {
        let mut state = self.state.lock().await;
        state.check_available()?;
        let mut touched = 0;
        for payment in state
            .payments
            .iter_mut()
            .filter(|p| p.provider == provider && p.intent_id == intent_id)
        {
            payment.complete = true;
            touched += 1;
        }
        Ok(touched)
    }

    async fn tickets_for_intent(
        &self,
        provider: PaymentProvider,
        intent_id: &str,
    ) -> Result<Vec<HeldTicket>, StoreError> {
        let state = self.state.lock().await;
        state.check_available()?;
        let payment_ids = state.payment_ids(provider, intent_id);
        Ok(state
            .tickets
            .iter()
            .filter(|t| t.payment_id.is_some_and(|id| payment_ids.contains(&id)))
            .map(|t| HeldTicket {
                ticket: t.clone(),
                guardian: t.guardian_id.and_then(|id| state.people.get(&id).cloned()),
            })
            .collect())
    }

    async fn delete_tickets_for_intent(
        &self,
        provider: PaymentProvider,
        intent_id: &str,
    ) -> Result<Vec<TicketId>, StoreError> {
        let mut state = self.state.lock().await;
        state.check_available()?;
        let payment_ids = state.payment_ids(provider, intent_id);
        let (deleted, kept): (Vec<Ticket>, Vec<Ticket>) = state
            .tickets
            .drain(..)
            .partition(|t| t.payment_id.is_some_and(|id| payment_ids.contains(&id)));
        state.tickets = kept;
        Ok(deleted.into_iter().map(|t| t.id).collect())
    }
}
