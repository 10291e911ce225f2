//! Payment finalization and withdrawal.

use crate::dispatch::dispatch_ticket_notices;
use crate::metrics::PaymentMetrics;
use crate::registrar::Registrar;
use registrar_core::error::{RegistrationError, Result};
use registrar_core::notify::TicketNotice;
use registrar_core::store::HeldTicket;
use registrar_core::{Event, EventId, PaymentProvider, TicketId};
use std::collections::HashMap;
use std::time::Instant;

impl Registrar {
    /// Confirms a paid intent: marks its payment complete and sends the notices skipped
    /// at issuance. Returns the IDs of the attached tickets.
    ///
    /// Safe to repeat; each call re-sends the notices.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::PaymentIncomplete`] if the gateway has not confirmed payment
    /// - gateway or store errors
    pub async fn finalize_payment(
        &self,
        intent_id: &str,
        provider: PaymentProvider,
    ) -> Result<Vec<TicketId>> {
        if !self.gateway_says_paid(intent_id, provider).await? {
            tracing::info!(intent_id, provider = %provider, "Finalize requested before payment completed");
            return Err(RegistrationError::PaymentIncomplete);
        }

        let env = self.environment();
        let updated = env.store.complete_payment(provider, intent_id).await?;
        let held = env.store.tickets_for_intent(provider, intent_id).await?;

        let notices = self.notices_for_held(held).await?;
        dispatch_ticket_notices(env.notifier.as_ref(), &notices).await;

        PaymentMetrics::record_finalized(provider);
        tracing::info!(
            intent_id,
            provider = %provider,
            payments = updated,
            tickets = notices.len(),
            "Payment finalized"
        );

        Ok(notices.into_iter().map(|notice| notice.ticket.id).collect())
    }

    /// Releases the seats held by an unpaid intent by deleting its tickets.
    ///
    /// Idempotent: a second call finds nothing to delete and still returns `true`.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::AlreadyPaid`] if the gateway reports the intent as paid
    /// - gateway or store errors
    pub async fn withdraw_failed_payment(
        &self,
        intent_id: &str,
        provider: PaymentProvider,
    ) -> Result<bool> {
        if self.gateway_says_paid(intent_id, provider).await? {
            tracing::warn!(intent_id, provider = %provider, "Withdrawal refused for a paid intent");
            return Err(RegistrationError::AlreadyPaid);
        }

        let deleted = self
            .environment()
            .store
            .delete_tickets_for_intent(provider, intent_id)
            .await?;

        PaymentMetrics::record_withdrawn(provider, deleted.len());
        tracing::info!(
            intent_id,
            provider = %provider,
            tickets = deleted.len(),
            "Unpaid payment withdrawn"
        );
        Ok(true)
    }

    async fn gateway_says_paid(&self, intent_id: &str, provider: PaymentProvider) -> Result<bool> {
        let gateway = self.environment().gateways.get(provider)?;
        let started = Instant::now();
        let paid = gateway.is_paid(intent_id).await;
        PaymentMetrics::record_gateway_call(provider, "is_paid", started.elapsed());
        Ok(paid?)
    }

    async fn notices_for_held(&self, held: Vec<HeldTicket>) -> Result<Vec<TicketNotice>> {
        let mut events: HashMap<EventId, Event> = HashMap::new();
        let mut notices = Vec::with_capacity(held.len());

        for HeldTicket { ticket, guardian } in held {
            let event = match events.get(&ticket.event_id) {
                Some(event) => event.clone(),
                None => {
                    let event = self.load_event(ticket.event_id).await?;
                    events.insert(event.id, event.clone());
                    event
                }
            };
            notices.push(TicketNotice { event, ticket, guardian });
        }

        Ok(notices)
    }
}
