//! Registration orchestrator.
//!
//! [`Registrar::register_for_event`] walks a request through validation, admission,
//! the guardian requirement, promo and price resolution, payment intent creation and
//! the atomic issuance, then dispatches notifications for free registrations.

use crate::dispatch::dispatch_ticket_notices;
use crate::metrics::{PaymentMetrics, RegistrationMetrics};
use registrar_core::admission::{Audience, admit, remaining_tickets};
use registrar_core::environment::Clock;
use registrar_core::error::{RegistrationError, Result};
use registrar_core::gateway::{GatewayRegistry, IntentRequest};
use registrar_core::notify::{TicketNotice, TicketNotifier};
use registrar_core::pricing::compute_price;
use registrar_core::promo::{self, PromoCheck};
use registrar_core::region::{RegionDirectory, resolve_payment_terms};
use registrar_core::store::{Issuance, IssuedRegistration, NewPayment, RegistrationStore};
use registrar_core::validation::{check_guardian, validate_tickets};
use registrar_core::{Event, EventId, Money, RegistrationRequest, Ticket};
use std::sync::Arc;
use std::time::Instant;

/// Injected dependencies of the orchestrator.
#[derive(Clone)]
pub struct RegistrarEnvironment {
    /// Persistence
    pub store: Arc<dyn RegistrationStore>,
    /// Payment back-ends by provider
    pub gateways: GatewayRegistry,
    /// Regional payment configuration
    pub regions: Arc<dyn RegionDirectory>,
    /// Waiver and webhook collaborator
    pub notifier: Arc<dyn TicketNotifier>,
    /// Time source
    pub clock: Arc<dyn Clock>,
}

/// How the price is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PriceMode {
    /// Active price after promo
    Standard,
    /// Forced to zero (approved scholarships)
    Waived,
}

/// Result of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Client-facing payment reference (`None` when nothing is owed)
    pub payment_reference: Option<String>,
    /// Unit price charged
    pub unit_price: Money,
    /// Issued tickets
    pub tickets: Vec<Ticket>,
}

/// The registration orchestrator.
///
/// Cheap to clone; all state lives in the injected dependencies.
#[derive(Clone)]
pub struct Registrar {
    env: Arc<RegistrarEnvironment>,
}

impl Registrar {
    /// Create an orchestrator over the given dependencies
    #[must_use]
    pub fn new(env: RegistrarEnvironment) -> Self {
        Self { env: Arc::new(env) }
    }

    /// Injected dependencies
    #[must_use]
    pub fn environment(&self) -> &RegistrarEnvironment {
        &self.env
    }

    /// Registers participants for an event.
    ///
    /// Returns the gateway's client reference when payment is owed, `None` otherwise.
    ///
    /// # Errors
    ///
    /// Returns the first [`RegistrationError`] encountered; nothing is persisted then.
    pub async fn register_for_event(&self, request: RegistrationRequest) -> Result<Option<String>> {
        self.register(request, PriceMode::Standard)
            .await
            .map(|registration| registration.payment_reference)
    }

    /// Registers participants at no charge, ignoring any promo code.
    ///
    /// Used by approved scholarships; all other checks still apply.
    ///
    /// # Errors
    ///
    /// Returns the first [`RegistrationError`] encountered.
    pub async fn register_waived(&self, mut request: RegistrationRequest) -> Result<Registration> {
        request.promo_code = None;
        self.register(request, PriceMode::Waived).await
    }

    async fn register(&self, request: RegistrationRequest, mode: PriceMode) -> Result<Registration> {
        let event_id = request.event_id;
        let tickets = request.tickets.len();

        let result = self.run_registration(request, mode).await;
        match &result {
            Ok(registration) => {
                RegistrationMetrics::record_success(tickets, registration.payment_reference.is_some());
                tracing::info!(
                    event_id = %event_id,
                    tickets,
                    unit_price = registration.unit_price.cents(),
                    paid = registration.payment_reference.is_some(),
                    "Registration issued"
                );
            }
            Err(error) => {
                RegistrationMetrics::record_failure(error.outcome_label());
                tracing::info!(
                    event_id = %event_id,
                    tickets,
                    code = error.code(),
                    error = %error,
                    "Registration rejected"
                );
            }
        }
        result
    }

    async fn run_registration(
        &self,
        request: RegistrationRequest,
        mode: PriceMode,
    ) -> Result<Registration> {
        let event = self.load_event(request.event_id).await?;
        let now = self.env.clock.now();

        validate_tickets(&event, &request.tickets)?;

        let sold = self.env.store.count_tickets(event.id).await?;
        let requested = u32::try_from(request.tickets.len()).unwrap_or(u32::MAX);
        admit(&event, sold, requested)?;

        check_guardian(&event, &request.tickets, request.guardian.as_ref())?;

        let promo = promo::resolve(
            self.env.store.as_ref(),
            event.id,
            request.promo_code.as_deref(),
        )
        .await?
        .map(|resolved| resolved.code);

        let unit_price = match mode {
            PriceMode::Standard => compute_price(&event, promo.as_ref(), now)?,
            PriceMode::Waived => Money::ZERO,
        };

        if event.requires_promo_code && promo.is_none() {
            return Err(RegistrationError::PromoRequired);
        }

        let (payment, payment_reference) = if unit_price.is_zero() {
            (None, None)
        } else {
            let (payment, reference) = self
                .open_payment(&event, &request, unit_price, requested)
                .await?;
            (Some(payment), Some(reference))
        };

        let issuance = Issuance::new(
            &event,
            request.tickets,
            request.guardian,
            promo,
            payment,
            now,
        );
        let issued = self.env.store.issue(issuance).await.inspect_err(|error| {
            if let Some(reference) = &payment_reference {
                tracing::warn!(
                    event_id = %event.id,
                    payment_reference = %reference,
                    error = %error,
                    "Issuance failed after the payment intent was opened"
                );
            }
        })?;

        if payment_reference.is_none() {
            let notices = notices_for(&event, &issued);
            dispatch_ticket_notices(self.env.notifier.as_ref(), &notices).await;
        }

        Ok(Registration { payment_reference, unit_price, tickets: issued.tickets })
    }

    /// Cross-checks the region and opens a gateway intent for the full amount.
    async fn open_payment(
        &self,
        event: &Event,
        request: &RegistrationRequest,
        unit_price: Money,
        quantity: u32,
    ) -> Result<(NewPayment, String)> {
        let info = self.env.regions.payment_info(&event.region_webname).await?;
        let currency = resolve_payment_terms(&info, request.provider)?;
        let gateway = self.env.gateways.get(request.provider)?;

        let intent_request = IntentRequest {
            unit_price,
            currency,
            quantity,
            event_id: event.id,
            event_name: event.name.clone(),
            region_webname: event.region_webname.clone(),
        };
        let amount = intent_request.total()?;

        let started = Instant::now();
        let intent = gateway.create_intent(&intent_request).await;
        PaymentMetrics::record_gateway_call(request.provider, "create_intent", started.elapsed());
        let intent = intent?;

        tracing::info!(
            event_id = %event.id,
            provider = %request.provider,
            intent_id = %intent.id,
            amount = amount.cents(),
            currency = %intent_request.currency,
            "Payment intent created"
        );

        let payment = NewPayment { provider: request.provider, intent_id: intent.id, amount };
        Ok((payment, intent.client_reference))
    }

    /// Previews a promo code without changing anything.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::EventNotFound`] or a store error.
    pub async fn check_promo_code(&self, event_id: EventId, code: &str) -> Result<PromoCheck> {
        let event = self.load_event(event_id).await?;
        let resolved = promo::resolve(self.env.store.as_ref(), event.id, Some(code)).await?;
        Ok(PromoCheck::evaluate(&event, resolved.as_ref(), self.env.clock.now()))
    }

    /// Remaining seats for an event as seen by `audience`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::EventNotFound`] or a store error.
    pub async fn remaining_tickets(&self, event_id: EventId, audience: Audience) -> Result<Option<u32>> {
        let event = self.load_event(event_id).await?;
        if event.capacity().is_none() {
            return Ok(None);
        }
        let sold = self.env.store.count_tickets(event.id).await?;
        Ok(remaining_tickets(&event, sold, audience))
    }

    pub(crate) async fn load_event(&self, event_id: EventId) -> Result<Event> {
        self.env
            .store
            .load_event(event_id)
            .await?
            .ok_or(RegistrationError::EventNotFound(event_id))
    }
}

impl std::fmt::Debug for Registrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registrar")
            .field("gateways", &self.env.gateways)
            .finish_non_exhaustive()
    }
}

fn notices_for(event: &Event, issued: &IssuedRegistration) -> Vec<TicketNotice> {
    issued
        .tickets
        .iter()
        .map(|ticket| TicketNotice {
            event: event.clone(),
            ticket: ticket.clone(),
            guardian: issued
                .guardian
                .clone()
                .filter(|guardian| ticket.guardian_id == Some(guardian.id)),
        })
        .collect()
}
